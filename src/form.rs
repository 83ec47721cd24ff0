use crate::error::PollerError;
use crate::models::DownloadRequest;

pub const FILL_ALL_FIELDS: &str = "Please fill all fields";

/// Input fields of the download form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub symbol: String,
    pub timeframe: String,
    pub start: String,
    pub end: String,
}

impl FormState {
    pub fn new(symbol: &str, timeframe: &str, start: &str, end: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            timeframe: timeframe.to_string(),
            start: start.to_string(),
            end: end.to_string(),
        }
    }

    /// Builds the request body. Only emptiness is checked; date formats are the server's concern.
    pub fn to_request(&self) -> Result<DownloadRequest, PollerError> {
        let symbol = self.symbol.trim();
        if symbol.is_empty() || self.start.is_empty() || self.end.is_empty() {
            return Err(PollerError::Validation(FILL_ALL_FIELDS.to_string()));
        }

        Ok(DownloadRequest {
            symbol: symbol.to_string(),
            timeframe: self.timeframe.clone(),
            start: self.start.clone(),
            end: self.end.clone(),
        })
    }

    /// Timeframe is a selector and keeps its value.
    pub fn clear(&mut self) {
        self.symbol.clear();
        self.start.clear();
        self.end.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_symbol() {
        let form = FormState::new("  BTC/USDT ", "1h", "2024-01-01", "2024-01-02");
        let req = form.to_request().unwrap();
        assert_eq!(req.symbol, "BTC/USDT");
        assert_eq!(req.timeframe, "1h");
    }

    #[test]
    fn rejects_blank_fields() {
        for form in [
            FormState::new("   ", "1h", "2024-01-01", "2024-01-02"),
            FormState::new("ETH", "1h", "", "2024-01-02"),
            FormState::new("ETH", "1h", "2024-01-01", ""),
        ] {
            assert!(matches!(form.to_request(), Err(PollerError::Validation(_))));
        }
    }

    #[test]
    fn accepts_any_timeframe_and_unparsed_dates() {
        let form = FormState::new("ETH", "", "yesterday", "today");
        assert!(form.to_request().is_ok());
    }

    #[test]
    fn clear_keeps_timeframe() {
        let mut form = FormState::new("ETH", "4h", "2024-01-01", "2024-01-02");
        form.clear();
        assert_eq!(form, FormState::new("", "4h", "", ""));
    }
}
