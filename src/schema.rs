use serde::Deserialize;

// ------------------------------------------------------------
// Instrument discovery
// ------------------------------------------------------------
//
// Response of `public/get_instruments`. Only the instrument name
// is needed; every other field is ignored.
//
#[derive(Debug, Deserialize, Clone)]
pub struct InstrumentsResponse {
    pub result: Vec<Instrument>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Instrument {
    pub instrument_name: String,
}
