pub mod agg_state;
pub mod bufferpool;
pub mod config;
pub mod error;
pub mod expr;
pub mod heap_file;
pub mod log_init;
pub mod operators;
pub mod page;
pub mod page_id;
pub mod tuple;
pub mod types;

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rand::Rng;

    use crate::bufferpool::{BufferPool, Permission};
    use crate::config::EngineConfig;
    use crate::error::SmallResult;
    use crate::expr::{ConstExpr, FieldExpr};
    use crate::heap_file::HeapFile;
    use crate::log_init::init_log;
    use crate::operators::filter::Filter;
    use crate::operators::limit::Limit;
    use crate::operators::sequential_scan::SequentialScan;
    use crate::operators::Operator;
    use crate::tuple::{Tuple, TupleDesc};
    use crate::types::{BoolOp, DBType, DBValue, FieldType};

    fn setup() -> (Arc<BufferPool>, Arc<HeapFile>, TupleDesc) {
        init_log();
        let config = EngineConfig::default().with_buffer_pool_capacity(8);
        let pool = Arc::new(BufferPool::new(config));
        let fields = vec![
            FieldType::new("id", "t", DBType::Int),
            FieldType::new("name", "t", DBType::String),
        ];
        let desc = TupleDesc::new(fields);
        let mut path = std::env::temp_dir();
        let suffix: u64 = rand::thread_rng().gen();
        path.push(format!("small_reldb_test_{}.dat", suffix));
        let file = Arc::new(
            HeapFile::new(&path, desc.clone(), config.page_size, config.string_length).unwrap(),
        );
        (pool, file, desc)
    }

    fn make_tuple(desc: &TupleDesc, id: i64, name: &str) -> Tuple {
        Tuple::new(desc.copy(), vec![DBValue::Int(id), DBValue::String(name.to_string())])
    }

    #[test]
    fn insert_then_scan_round_trips() -> SmallResult {
        let (pool, file, desc) = setup();
        let tid = pool.begin_transaction();
        for i in 0..20 {
            let t = make_tuple(&desc, i, &format!("row-{}", i));
            file.insert_tuple(tid, &pool, t)?;
        }
        pool.commit_transaction(tid)?;

        let tid2 = pool.begin_transaction();
        let mut scan = SequentialScan::new(tid2, pool.clone(), file.clone());
        scan.open()?;
        let mut count = 0;
        while scan.next()?.is_some() {
            count += 1;
        }
        assert_eq!(count, 20);
        pool.commit_transaction(tid2)?;
        Ok(())
    }

    #[test]
    fn abort_rolls_back_inserts() -> SmallResult {
        let (pool, file, desc) = setup();
        let tid = pool.begin_transaction();
        file.insert_tuple(tid, &pool, make_tuple(&desc, 1, "a"))?;
        pool.commit_transaction(tid)?;

        let tid2 = pool.begin_transaction();
        file.insert_tuple(tid2, &pool, make_tuple(&desc, 2, "b"))?;
        pool.abort_transaction(tid2);

        let tid3 = pool.begin_transaction();
        let mut scan = SequentialScan::new(tid3, pool.clone(), file.clone());
        scan.open()?;
        let mut count = 0;
        while scan.next()?.is_some() {
            count += 1;
        }
        assert_eq!(count, 1);
        pool.commit_transaction(tid3)?;
        Ok(())
    }

    #[test]
    fn filter_keeps_only_matching_rows() -> SmallResult {
        let (pool, file, desc) = setup();
        let tid = pool.begin_transaction();
        for i in 0..10 {
            file.insert_tuple(tid, &pool, make_tuple(&desc, i, "row"))?;
        }
        pool.commit_transaction(tid)?;

        let tid2 = pool.begin_transaction();
        let scan = SequentialScan::new(tid2, pool.clone(), file.clone());
        let lhs = Box::new(FieldExpr::new("id", "t", DBType::Int));
        let rhs = Box::new(ConstExpr::new(DBValue::Int(5)));
        let mut filter = Filter::new(Box::new(scan), lhs, BoolOp::GreaterThanOrEqual, rhs)?;
        filter.open()?;
        let mut count = 0;
        while filter.next()?.is_some() {
            count += 1;
        }
        assert_eq!(count, 5);
        pool.commit_transaction(tid2)?;
        Ok(())
    }

    #[test]
    fn limit_caps_output() -> SmallResult {
        let (pool, file, desc) = setup();
        let tid = pool.begin_transaction();
        for i in 0..10 {
            file.insert_tuple(tid, &pool, make_tuple(&desc, i, "row"))?;
        }
        pool.commit_transaction(tid)?;

        let tid2 = pool.begin_transaction();
        let scan = SequentialScan::new(tid2, pool.clone(), file.clone());
        let mut limit = Limit::new(Box::new(scan), 3);
        limit.open()?;
        let mut count = 0;
        while limit.next()?.is_some() {
            count += 1;
        }
        assert_eq!(count, 3);
        pool.commit_transaction(tid2)?;
        Ok(())
    }

    #[test]
    fn concurrent_readers_share_a_page_lock() -> SmallResult {
        let (pool, file, desc) = setup();
        let tid = pool.begin_transaction();
        file.insert_tuple(tid, &pool, make_tuple(&desc, 1, "a"))?;
        pool.commit_transaction(tid)?;

        let tid_a = pool.begin_transaction();
        let tid_b = pool.begin_transaction();
        let page_a = pool.get_page(tid_a, &file, 0, Permission::ReadOnly)?;
        let page_b = pool.get_page(tid_b, &file, 0, Permission::ReadOnly)?;
        assert!(Arc::ptr_eq(&page_a, &page_b));
        pool.commit_transaction(tid_a)?;
        pool.commit_transaction(tid_b)?;
        Ok(())
    }
}
