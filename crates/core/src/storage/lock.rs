use anyhow::Context;
use chrono::NaiveDate;

// Advisory locks are scoped to the Postgres session, so acquire and release must run on the same
// connection. Guards against concurrent cache warm-ups of the same city and stay window.
const LOCK_NAMESPACE: i32 = 0x5354_4159; // "STAY"

fn lock_name(city: &str, check_in: NaiveDate, check_out: NaiveDate) -> String {
    format!("{}:{check_in}:{check_out}", city.trim().to_lowercase())
}

pub async fn try_acquire_warmup_lock(
    conn: &mut sqlx::PgConnection,
    city: &str,
    check_in: NaiveDate,
    check_out: NaiveDate,
) -> anyhow::Result<bool> {
    let name = lock_name(city, check_in, check_out);
    let acquired: (bool,) = sqlx::query_as("SELECT pg_try_advisory_lock($1, hashtext($2))")
        .persistent(false)
        .bind(LOCK_NAMESPACE)
        .bind(&name)
        .fetch_one(&mut *conn)
        .await
        .with_context(|| format!("failed to acquire advisory lock (name={name})"))?;
    Ok(acquired.0)
}

pub async fn release_warmup_lock(
    conn: &mut sqlx::PgConnection,
    city: &str,
    check_in: NaiveDate,
    check_out: NaiveDate,
) -> anyhow::Result<()> {
    let name = lock_name(city, check_in, check_out);
    sqlx::query("SELECT pg_advisory_unlock($1, hashtext($2))")
        .persistent(false)
        .bind(LOCK_NAMESPACE)
        .bind(&name)
        .execute(&mut *conn)
        .await
        .with_context(|| format!("failed to release advisory lock (name={name})"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_name_ignores_city_case_and_padding() {
        let a = NaiveDate::from_ymd_opt(2026, 11, 6).unwrap();
        let b = NaiveDate::from_ymd_opt(2026, 11, 9).unwrap();
        assert_eq!(lock_name(" Jaipur", a, b), lock_name("jaipur", a, b));
        assert_eq!(lock_name("Jaipur", a, b), "jaipur:2026-11-06:2026-11-09");
    }
}
