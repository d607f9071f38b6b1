#![allow(dead_code)]

use connectors::SqlAdapter;
use model::core::value::Value;

/// `customers(id PK, name, created_at)` / `orders(id PK, customer_id FK,
/// total)`, the Scenario A schema (§8.3).
pub const CUSTOMERS_ORDERS_MYSQL_DDL: &[&str] = &[
    "CREATE TABLE customers (
        id BIGINT PRIMARY KEY,
        name VARCHAR(255) NOT NULL,
        created_at DATE NOT NULL
    ) ENGINE=InnoDB",
    "CREATE TABLE orders (
        id BIGINT PRIMARY KEY,
        customer_id BIGINT NOT NULL,
        total DECIMAL(10,2) NOT NULL,
        INDEX idx_orders_customer_id (customer_id),
        CONSTRAINT fk_orders_customer FOREIGN KEY (customer_id) REFERENCES customers(id)
    ) ENGINE=InnoDB",
];

pub const CUSTOMERS_ORDERS_PG_DDL: &[&str] = &[
    "CREATE TABLE customers (
        id BIGINT PRIMARY KEY,
        name TEXT NOT NULL,
        created_at DATE NOT NULL
    )",
    "CREATE TABLE orders (
        id BIGINT PRIMARY KEY,
        customer_id BIGINT NOT NULL REFERENCES customers(id),
        total NUMERIC(10,2) NOT NULL
    )",
];

/// Scenario B's `A -> B -> C -> D` chain, one table per level.
pub const DEEP_CHAIN_MYSQL_DDL: &[&str] = &[
    "CREATE TABLE tbl_a (id BIGINT PRIMARY KEY, created_at DATE NOT NULL) ENGINE=InnoDB",
    "CREATE TABLE tbl_b (
        id BIGINT PRIMARY KEY,
        a_id BIGINT NOT NULL,
        INDEX idx_tbl_b_a_id (a_id),
        CONSTRAINT fk_tbl_b_a FOREIGN KEY (a_id) REFERENCES tbl_a(id)
    ) ENGINE=InnoDB",
    "CREATE TABLE tbl_c (
        id BIGINT PRIMARY KEY,
        b_id BIGINT NOT NULL,
        INDEX idx_tbl_c_b_id (b_id),
        CONSTRAINT fk_tbl_c_b FOREIGN KEY (b_id) REFERENCES tbl_b(id)
    ) ENGINE=InnoDB",
    "CREATE TABLE tbl_d (
        id BIGINT PRIMARY KEY,
        c_id BIGINT NOT NULL,
        INDEX idx_tbl_d_c_id (c_id),
        CONSTRAINT fk_tbl_d_c FOREIGN KEY (c_id) REFERENCES tbl_c(id)
    ) ENGINE=InnoDB",
];

pub const DEEP_CHAIN_PG_DDL: &[&str] = &[
    "CREATE TABLE tbl_a (id BIGINT PRIMARY KEY, created_at DATE NOT NULL)",
    "CREATE TABLE tbl_b (id BIGINT PRIMARY KEY, a_id BIGINT NOT NULL REFERENCES tbl_a(id))",
    "CREATE TABLE tbl_c (id BIGINT PRIMARY KEY, b_id BIGINT NOT NULL REFERENCES tbl_b(id))",
    "CREATE TABLE tbl_d (id BIGINT PRIMARY KEY, c_id BIGINT NOT NULL REFERENCES tbl_c(id))",
];

/// Scenario F's unsafe schema: `orders.customer_id` has no covering index.
pub const UNINDEXED_FK_MYSQL_DDL: &[&str] = &[
    "CREATE TABLE customers (id BIGINT PRIMARY KEY, created_at DATE NOT NULL) ENGINE=InnoDB",
    "CREATE TABLE orders (
        id BIGINT PRIMARY KEY,
        customer_id BIGINT NOT NULL,
        CONSTRAINT fk_orders_customer FOREIGN KEY (customer_id) REFERENCES customers(id)
    ) ENGINE=InnoDB",
];

pub async fn apply_ddl(adapter: &dyn SqlAdapter, statements: &[&str]) {
    for stmt in statements {
        adapter.exec(stmt, &[]).await.expect("apply DDL");
    }
}

pub async fn row_count(adapter: &dyn SqlAdapter, table: &str) -> i64 {
    let rows = adapter
        .query(&format!("SELECT COUNT(*) AS cnt FROM {table}"), &[])
        .await
        .expect("row count query");
    rows.first()
        .and_then(|r| r.get_value("cnt").as_i64())
        .unwrap_or(0)
}

pub async fn ids_in(adapter: &dyn SqlAdapter, table: &str) -> Vec<i64> {
    let rows = adapter
        .query(&format!("SELECT id FROM {table} ORDER BY id"), &[])
        .await
        .expect("id query");
    rows.iter().filter_map(|r| r.get_value("id").as_i64()).collect()
}

pub async fn insert_row(adapter: &dyn SqlAdapter, sql: &str, params: &[Value]) {
    adapter.exec(sql, params).await.expect("insert row");
}
