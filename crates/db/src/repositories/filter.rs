//! Shared query fragments.

use sea_orm::sea_query::{Expr, Func, IntoColumnRef, LikeExpr, SimpleExpr};

/// Escape `%`, `_` and `\` so user input matches literally inside LIKE.
#[must_use]
pub fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Case-insensitive substring match: `LOWER(col) LIKE '%needle%'`.
pub fn contains_ci<C: IntoColumnRef>(col: C, needle: &str) -> SimpleExpr {
    let pattern = format!("%{}%", escape_like(&needle.to_lowercase()));
    Expr::expr(Func::lower(Expr::col(col))).like(LikeExpr::new(pattern).escape('\\'))
}

/// Prefix match on an already-lowercased column: `col LIKE 'prefix%'`.
pub fn starts_with<C: IntoColumnRef>(col: C, prefix: &str) -> SimpleExpr {
    let pattern = format!("{}%", escape_like(prefix));
    Expr::col(col).like(LikeExpr::new(pattern).escape('\\'))
}
