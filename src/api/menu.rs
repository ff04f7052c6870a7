//! Menu lookup.

use tracing::instrument;

use crate::api::ApiClient;
use crate::Result;

/// Menu entries the backend enables for the signed-in user.
#[derive(Clone)]
pub struct MenuService {
    client: ApiClient,
}

impl MenuService {
    pub fn new(client: ApiClient) -> Self { Self { client } }

    #[instrument(skip(self))]
    pub async fn menu(&self) -> Result<Vec<String>> {
        self.client.get("menu", &[]).await
    }
}
