use sqlx::sqlite::SqlitePool;

use crate::directory::{DirectoryUser, Permission, Role};

#[derive(Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    name: String,
    email: String,
    password_hash: String,
}

impl UserRow {
    fn into_user(self, roles: Vec<Role>) -> DirectoryUser {
        DirectoryUser {
            id: self.id,
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
            roles,
        }
    }
}

impl UserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new user. Returns the user ID.
    pub async fn create(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<i64, sqlx::Error> {
        let result =
            sqlx::query("INSERT INTO users (name, email, password_hash) VALUES (?, ?, ?)")
                .bind(name)
                .bind(email)
                .bind(password_hash)
                .execute(&self.pool)
                .await?;
        Ok(result.last_insert_rowid())
    }

    /// Get a user with roles and permissions by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<DirectoryUser>, sqlx::Error> {
        let row: Option<UserRow> =
            sqlx::query_as("SELECT id, name, email, password_hash FROM users WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        self.with_roles(row).await
    }

    /// Get a user with roles and permissions by email (case-insensitive).
    pub async fn get_by_email(&self, email: &str) -> Result<Option<DirectoryUser>, sqlx::Error> {
        let row: Option<UserRow> =
            sqlx::query_as("SELECT id, name, email, password_hash FROM users WHERE email = ?")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;
        self.with_roles(row).await
    }

    async fn with_roles(&self, row: Option<UserRow>) -> Result<Option<DirectoryUser>, sqlx::Error> {
        match row {
            Some(row) => {
                let roles = self.roles_for(row.id).await?;
                Ok(Some(row.into_user(roles)))
            }
            None => Ok(None),
        }
    }

    /// List the roles assigned to a user, each with its permissions.
    pub async fn roles_for(&self, user_id: i64) -> Result<Vec<Role>, sqlx::Error> {
        let rows: Vec<(String, Option<String>)> = sqlx::query_as(
            "SELECT r.name, p.type
             FROM user_roles ur
             JOIN roles r ON r.id = ur.role_id
             LEFT JOIN role_permissions rp ON rp.role_id = r.id
             LEFT JOIN permissions p ON p.id = rp.permission_id
             WHERE ur.user_id = ?
             ORDER BY r.name, p.type",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut roles: Vec<Role> = Vec::new();
        for (role_name, permission) in rows {
            if roles.last().is_none_or(|role| role.name != role_name) {
                roles.push(Role {
                    name: role_name,
                    permissions: Vec::new(),
                });
            }
            if let (Some(kind), Some(role)) = (permission, roles.last_mut()) {
                role.permissions.push(Permission { kind });
            }
        }
        Ok(roles)
    }

    /// Get or create a role by name. Returns the role ID.
    pub async fn ensure_role(&self, name: &str) -> Result<i64, sqlx::Error> {
        sqlx::query("INSERT OR IGNORE INTO roles (name) VALUES (?)")
            .bind(name)
            .execute(&self.pool)
            .await?;
        let (id,): (i64,) = sqlx::query_as("SELECT id FROM roles WHERE name = ?")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;
        Ok(id)
    }

    /// Attach a permission type to a role, creating the permission if needed.
    pub async fn grant_permission(&self, role_id: i64, kind: &str) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT OR IGNORE INTO permissions (type) VALUES (?)")
            .bind(kind)
            .execute(&self.pool)
            .await?;
        sqlx::query(
            "INSERT OR IGNORE INTO role_permissions (role_id, permission_id)
             SELECT ?, id FROM permissions WHERE type = ?",
        )
        .bind(role_id)
        .bind(kind)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Assign a role to a user. Returns false if it was already assigned.
    pub async fn assign_role(&self, user_id: i64, role_id: i64) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("INSERT OR IGNORE INTO user_roles (user_id, role_id) VALUES (?, ?)")
                .bind(user_id)
                .bind(role_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
