use rusqlite::{Connection, params};

use crate::models::{CASHBACK_RATE_KEY, DEFAULT_CASHBACK_RATE};

/// Initialize the database schema. Safe to run on every start.
pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        -- Users (points balance plus running group totals). The typeof checks
        -- reject the REAL that SQLite produces when an integer sum overflows
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL UNIQUE,
            first_name TEXT NOT NULL,
            password_hash TEXT NOT NULL,
            balance INTEGER NOT NULL DEFAULT 0
                CHECK (typeof(balance) = 'integer' AND balance >= 0),
            is_admin INTEGER NOT NULL DEFAULT 0,
            group_id INTEGER REFERENCES expense_groups(id) ON DELETE SET NULL,
            group_spend INTEGER NOT NULL DEFAULT 0 CHECK (typeof(group_spend) = 'integer'),
            group_debt INTEGER NOT NULL DEFAULT 0 CHECK (typeof(group_debt) = 'integer'),
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_users_group ON users(group_id);

        -- Expense-splitting groups; balance = sum of open transaction amounts
        CREATE TABLE IF NOT EXISTS expense_groups (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            creator_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
            balance INTEGER NOT NULL DEFAULT 0 CHECK (typeof(balance) = 'integer'),
            created_at INTEGER NOT NULL
        );

        -- Open group transactions. Closing deletes the row.
        -- user_id is the creditor; no FK so history survives account removal
        CREATE TABLE IF NOT EXISTS group_transactions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            group_id INTEGER NOT NULL REFERENCES expense_groups(id) ON DELETE CASCADE,
            user_id INTEGER NOT NULL,
            amount INTEGER NOT NULL CHECK (amount > 0),
            reference TEXT,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_group_transactions_group ON group_transactions(group_id);
        CREATE INDEX IF NOT EXISTS idx_group_transactions_user ON group_transactions(user_id);

        -- Per-debtor shares, recorded at creation so closing reverses exactly
        CREATE TABLE IF NOT EXISTS group_transaction_shares (
            transaction_id INTEGER NOT NULL REFERENCES group_transactions(id) ON DELETE CASCADE,
            user_id INTEGER NOT NULL,
            amount INTEGER NOT NULL CHECK (amount >= 0),
            PRIMARY KEY (transaction_id, user_id)
        );
        CREATE INDEX IF NOT EXISTS idx_group_shares_user ON group_transaction_shares(user_id);

        -- "I've paid" acknowledgements; informational only
        CREATE TABLE IF NOT EXISTS group_payment_status (
            transaction_id INTEGER NOT NULL REFERENCES group_transactions(id) ON DELETE CASCADE,
            user_id INTEGER NOT NULL,
            marked_paid INTEGER NOT NULL DEFAULT 0,
            marked_at INTEGER,
            PRIMARY KEY (transaction_id, user_id)
        );

        CREATE TABLE IF NOT EXISTS categories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS rewards (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            description TEXT,
            cost INTEGER NOT NULL CHECK (cost > 0),
            image_url TEXT,
            is_active INTEGER NOT NULL DEFAULT 1,
            redemptions INTEGER NOT NULL DEFAULT 0,
            category_id INTEGER REFERENCES categories(id) ON DELETE SET NULL,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_rewards_active ON rewards(id) WHERE is_active = 1;

        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at INTEGER NOT NULL
        );

        -- Bill payments that earned cashback
        CREATE TABLE IF NOT EXISTS payments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            reference TEXT NOT NULL,
            amount INTEGER NOT NULL CHECK (amount > 0),
            points_awarded INTEGER NOT NULL,
            cashback_rate REAL NOT NULL,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_payments_user ON payments(user_id, created_at);

        CREATE TABLE IF NOT EXISTS redeemed_rewards (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            reward_id INTEGER NOT NULL REFERENCES rewards(id),
            points_spent INTEGER NOT NULL,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_redeemed_rewards_user ON redeemed_rewards(user_id, created_at);

        CREATE TABLE IF NOT EXISTS favourite_rewards (
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            reward_id INTEGER NOT NULL REFERENCES rewards(id) ON DELETE CASCADE,
            created_at INTEGER NOT NULL,
            PRIMARY KEY (user_id, reward_id)
        );
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)",
        params![
            CASHBACK_RATE_KEY,
            DEFAULT_CASHBACK_RATE,
            chrono::Utc::now().timestamp()
        ],
    )?;

    Ok(())
}
