use gk_schemas::intent::Direction;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaperOrderStatus {
    Accepted,
    Filled,
    Cancelled,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PaperOrder {
    pub client_order_id: String,
    pub instrument: String,
    pub side: Direction,
    pub size_usd: f64,
    pub limit_price: Option<f64>,
    pub status: PaperOrderStatus,
    pub filled_price: Option<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PaperPosition {
    pub instrument: String,
    pub net_exposure_usd: f64,
}
