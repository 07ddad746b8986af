//! The controller's RPC client to the broker: one typed method per route,
//! built on `reqwest::Client` + `serde_json`.

use crate::wire::{
    AliveCellsCountResponse, CalculateAliveCellsResponse, EvolveWorldRequest, EvolveWorldResponse,
    GetCellFlippedResponse, GetGlobalResponse, GetTurnDoneResponse, Params, World,
};

#[derive(Debug, thiserror::Error)]
pub enum BrokerClientError {
    #[error("request to broker failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("broker returned HTTP {status}: {body}")]
    Status { status: reqwest::StatusCode, body: String },
}

#[derive(Clone)]
pub struct BrokerClient {
    base_url: String,
    http: reqwest::Client,
}

impl BrokerClient {
    pub fn new(addr: &str) -> Self {
        Self { base_url: format!("http://{addr}"), http: reqwest::Client::new() }
    }

    async fn post_json<Req: serde::Serialize, Res: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &Req,
    ) -> Result<Res, BrokerClientError> {
        let resp = self.http.post(format!("{}{path}", self.base_url)).json(body).send().await?;
        Self::decode(resp).await
    }

    async fn post_empty<Res: serde::de::DeserializeOwned>(&self, path: &str) -> Result<Res, BrokerClientError> {
        let resp = self.http.post(format!("{}{path}", self.base_url)).send().await?;
        Self::decode(resp).await
    }

    async fn get<Res: serde::de::DeserializeOwned>(&self, path: &str) -> Result<Res, BrokerClientError> {
        let resp = self.http.get(format!("{}{path}", self.base_url)).send().await?;
        Self::decode(resp).await
    }

    async fn decode<Res: serde::de::DeserializeOwned>(resp: reqwest::Response) -> Result<Res, BrokerClientError> {
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(BrokerClientError::Status { status, body: text });
        }
        serde_json::from_str(&text).map_err(|e| BrokerClientError::Status {
            status,
            body: format!("failed to decode response: {e}; body was: {text}"),
        })
    }

    pub async fn evolve_world(&self, world: World, params: Params) -> Result<EvolveWorldResponse, BrokerClientError> {
        self.post_json("/evolve", &EvolveWorldRequest { world, params }).await
    }

    pub async fn pause(&self) -> Result<(), BrokerClientError> {
        self.post_empty::<crate::wire::Empty>("/pause").await.map(|_| ())
    }

    pub async fn unpause(&self) -> Result<(), BrokerClientError> {
        self.post_empty::<crate::wire::Empty>("/unpause").await.map(|_| ())
    }

    pub async fn quit_server(&self) -> Result<(), BrokerClientError> {
        self.post_empty::<crate::wire::Empty>("/quit").await.map(|_| ())
    }

    pub async fn kill_server(&self) -> Result<(), BrokerClientError> {
        self.post_empty::<crate::wire::Empty>("/kill").await.map(|_| ())
    }

    pub async fn alive_cells_count(&self) -> Result<AliveCellsCountResponse, BrokerClientError> {
        self.get("/alive-count").await
    }

    pub async fn calculate_alive_cells(&self) -> Result<CalculateAliveCellsResponse, BrokerClientError> {
        self.get("/alive-cells").await
    }

    pub async fn get_global(&self) -> Result<GetGlobalResponse, BrokerClientError> {
        self.get("/global").await
    }

    pub async fn get_turn_done(&self) -> Result<GetTurnDoneResponse, BrokerClientError> {
        self.get("/turn-done").await
    }

    pub async fn get_cell_flipped(&self) -> Result<GetCellFlippedResponse, BrokerClientError> {
        self.get("/flipped").await
    }
}
