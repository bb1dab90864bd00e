use super::{format_timestamp, now, parse_timestamp, Store};
use crate::error::ServiceResult;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

impl Store {
    /// Provisions a bearer token for `owner_id`, replacing any previous owner or expiry
    /// of the same token.
    pub fn register_token(
        &self,
        owner_id: &str,
        token: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> ServiceResult<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO api_tokens (token, owner_id, expires_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(token) DO UPDATE SET owner_id = excluded.owner_id, expires_at = excluded.expires_at",
                params![token, owner_id, expires_at.as_ref().map(format_timestamp)],
            )?;
            Ok(())
        })
    }

    /// Owner behind a token. Unknown and expired tokens resolve to `None`.
    pub fn resolve_token(&self, token: &str) -> ServiceResult<Option<String>> {
        self.with_conn(|conn| {
            let found = conn
                .query_row(
                    "SELECT owner_id, expires_at FROM api_tokens WHERE token = ?1",
                    params![token],
                    |row| {
                        let expires_at = match row.get::<_, Option<String>>(1)? {
                            Some(raw) => Some(parse_timestamp(1, &raw)?),
                            None => None,
                        };
                        Ok((row.get::<_, String>(0)?, expires_at))
                    },
                )
                .optional()?;

            Ok(match found {
                Some((_, Some(expires_at))) if expires_at <= now() => None,
                Some((owner_id, _)) => Some(owner_id),
                None => None,
            })
        })
    }
}
