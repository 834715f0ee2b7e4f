use std::sync::Arc;

use rand::Rng;

use small_reldb::agg_state::AggOp;
use small_reldb::bufferpool::BufferPool;
use small_reldb::config::EngineConfig;
use small_reldb::error::SmallResult;
use small_reldb::expr::FieldExpr;
use small_reldb::heap_file::HeapFile;
use small_reldb::log_init::init_log;
use small_reldb::operators::aggregate::{AggTemplate, Aggregator};
use small_reldb::operators::join::EqualityJoin;
use small_reldb::operators::order_by::OrderBy;
use small_reldb::operators::project::Project;
use small_reldb::operators::sequential_scan::SequentialScan;
use small_reldb::operators::Operator;
use small_reldb::tuple::{Tuple, TupleDesc};
use small_reldb::types::{DBType, DBValue, FieldType};

fn temp_path(tag: &str) -> std::path::PathBuf {
    let mut path = std::env::temp_dir();
    let suffix: u64 = rand::thread_rng().gen();
    path.push(format!("small_reldb_{}_{}.dat", tag, suffix));
    path
}

fn open_file(path: &std::path::Path, desc: TupleDesc, config: &EngineConfig) -> Arc<HeapFile> {
    Arc::new(HeapFile::new(path, desc, config.page_size, config.string_length).unwrap())
}

/// `orders(id Int, customer Int, total Int)` grouped and summed by
/// `customer`, then ordered by the summed total descending.
#[test]
fn grouped_sum_then_order_by_descending() -> SmallResult {
    init_log();
    let config = EngineConfig::default();
    let pool = Arc::new(BufferPool::new(config));

    let desc = TupleDesc::new(vec![
        FieldType::new("id", "orders", DBType::Int),
        FieldType::new("customer", "orders", DBType::Int),
        FieldType::new("total", "orders", DBType::Int),
    ]);
    let file = open_file(&temp_path("orders"), desc.clone(), &config);

    let tid = pool.begin_transaction();
    let rows = [(1, 1, 100), (2, 1, 50), (3, 2, 10), (4, 2, 5), (5, 3, 999)];
    for (id, customer, total) in rows {
        let tuple = Tuple::new(
            desc.copy(),
            vec![DBValue::Int(id), DBValue::Int(customer), DBValue::Int(total)],
        );
        file.insert_tuple(tid, &pool, tuple)?;
    }
    pool.commit_transaction(tid)?;

    let tid2 = pool.begin_transaction();
    let scan = SequentialScan::new(tid2, pool.clone(), file.clone());
    let group_expr: Box<dyn small_reldb::expr::Expr> = Box::new(FieldExpr::new("customer", "orders", DBType::Int));
    let group_field = FieldType::new("customer", "orders", DBType::Int);
    let agg_expr = Box::new(FieldExpr::new("total", "orders", DBType::Int));
    let aggregator = Aggregator::new(
        Box::new(scan),
        vec![group_expr],
        vec![group_field],
        vec![AggTemplate::new(agg_expr, AggOp::Sum, "total_sum")],
    );
    let order_key = Box::new(FieldExpr::new("total_sum", "", DBType::Int));
    let mut order_by = OrderBy::new(Box::new(aggregator), vec![(order_key, false)]);

    order_by.open()?;
    let mut totals = Vec::new();
    while let Some(t) = order_by.next()? {
        totals.push(t.fields[1].as_int().unwrap());
    }
    assert_eq!(totals, vec![999, 150, 15]);
    pool.commit_transaction(tid2)?;
    Ok(())
}

/// `customers(id Int, name String)` joined with `orders(id Int, customer Int)`
/// on `customers.id == orders.customer`.
#[test]
fn equality_join_matches_on_shared_key() -> SmallResult {
    init_log();
    let config = EngineConfig::default();
    let pool = Arc::new(BufferPool::new(config));

    let customers_desc = TupleDesc::new(vec![
        FieldType::new("id", "customers", DBType::Int),
        FieldType::new("name", "customers", DBType::String),
    ]);
    let customers = open_file(&temp_path("customers"), customers_desc.clone(), &config);

    let orders_desc = TupleDesc::new(vec![
        FieldType::new("id", "orders", DBType::Int),
        FieldType::new("customer", "orders", DBType::Int),
    ]);
    let orders = open_file(&temp_path("orders"), orders_desc.clone(), &config);

    let tid = pool.begin_transaction();
    for (id, name) in [(1, "alice"), (2, "bob")] {
        let t = Tuple::new(
            customers_desc.copy(),
            vec![DBValue::Int(id), DBValue::String(name.to_string())],
        );
        customers.insert_tuple(tid, &pool, t)?;
    }
    for (id, customer) in [(10, 1), (11, 1), (12, 2)] {
        let t = Tuple::new(orders_desc.copy(), vec![DBValue::Int(id), DBValue::Int(customer)]);
        orders.insert_tuple(tid, &pool, t)?;
    }
    pool.commit_transaction(tid)?;

    let tid2 = pool.begin_transaction();
    let left = SequentialScan::new(tid2, pool.clone(), customers.clone());
    let right = SequentialScan::new(tid2, pool.clone(), orders.clone());
    let left_expr = Box::new(FieldExpr::new("id", "customers", DBType::Int));
    let right_expr = Box::new(FieldExpr::new("customer", "orders", DBType::Int));
    let mut join = EqualityJoin::new(Box::new(left), Box::new(right), left_expr, right_expr);

    join.open()?;
    let mut count = 0;
    while join.next()?.is_some() {
        count += 1;
    }
    assert_eq!(count, 3);
    pool.commit_transaction(tid2)?;
    Ok(())
}

/// Projecting down to a single repeated field with `distinct` collapses
/// duplicates.
#[test]
fn distinct_project_collapses_duplicates() -> SmallResult {
    init_log();
    let config = EngineConfig::default();
    let pool = Arc::new(BufferPool::new(config));

    let desc = TupleDesc::new(vec![
        FieldType::new("category", "t", DBType::String),
        FieldType::new("id", "t", DBType::Int),
    ]);
    let file = open_file(&temp_path("catalog"), desc.clone(), &config);

    let tid = pool.begin_transaction();
    for (category, id) in [("a", 1), ("a", 2), ("b", 3), ("a", 4), ("b", 5)] {
        let t = Tuple::new(
            desc.copy(),
            vec![DBValue::String(category.to_string()), DBValue::Int(id)],
        );
        file.insert_tuple(tid, &pool, t)?;
    }
    pool.commit_transaction(tid)?;

    let tid2 = pool.begin_transaction();
    let scan = SequentialScan::new(tid2, pool.clone(), file.clone());
    let select_exprs: Vec<Box<dyn small_reldb::expr::Expr>> =
        vec![Box::new(FieldExpr::new("category", "t", DBType::String))];
    let mut project = Project::new(Box::new(scan), select_exprs, vec!["category".to_string()], true)?;

    project.open()?;
    let mut seen = Vec::new();
    while let Some(t) = project.next()? {
        seen.push(t.fields[0].as_str().unwrap().to_string());
    }
    seen.sort();
    assert_eq!(seen, vec!["a".to_string(), "b".to_string()]);
    pool.commit_transaction(tid2)?;
    Ok(())
}
