use time::OffsetDateTime;
use uuid::Uuid;

use reel_storage::queries;

use crate::{ReelService, ServiceResult};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SessionResponse {
	pub session_id: Uuid,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SessionInfo {
	pub session_id: Uuid,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
	#[serde(with = "crate::time_serde")]
	pub last_updated: OffsetDateTime,
}

impl ReelService {
	pub async fn create_session(&self) -> ServiceResult<SessionResponse> {
		let row = queries::insert_session(&self.db.pool).await?;

		Ok(SessionResponse { session_id: row.session_id, created_at: row.created_at })
	}

	pub async fn list_sessions(&self) -> ServiceResult<Vec<SessionInfo>> {
		let rows = queries::list_sessions(&self.db.pool).await?;

		Ok(rows
			.into_iter()
			.map(|row| SessionInfo {
				session_id: row.session_id,
				created_at: row.created_at,
				last_updated: row.last_updated,
			})
			.collect())
	}
}
