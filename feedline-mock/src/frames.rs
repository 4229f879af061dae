//! Builders for inbound frame payloads, as the gateway would send them.

use feedline_core::codec::msg;
use feedline_core::{Bar, ContractDetails, encode_fields};

fn frame(fields: Vec<String>) -> Vec<u8> {
    encode_fields(fields)
}

/// `nextValidId`.
#[must_use]
pub fn next_valid_id(order_id: i64) -> Vec<u8> {
    frame(vec![
        msg::NEXT_VALID_ID.to_string(),
        "1".into(),
        order_id.to_string(),
    ])
}

/// One `contractDetails` reply.
#[must_use]
pub fn contract_data(req_id: i64, details: &ContractDetails) -> Vec<u8> {
    let c = &details.contract;
    frame(vec![
        msg::CONTRACT_DATA.to_string(),
        "8".into(),
        req_id.to_string(),
        c.symbol.clone(),
        c.product_type.code().to_string(),
        c.contract_month.clone(),
        c.venue.clone(),
        c.local_symbol.clone(),
        details.market_name.clone(),
        c.trading_class.clone(),
    ])
}

/// `contractDetailsEnd`.
#[must_use]
pub fn contract_data_end(req_id: i64) -> Vec<u8> {
    frame(vec![
        msg::CONTRACT_DATA_END.to_string(),
        "1".into(),
        req_id.to_string(),
    ])
}

/// A historical pull: every bar followed by the end marker.
#[must_use]
pub fn historical(req_id: i64, start: &str, end: &str, bars: &[Bar]) -> Vec<u8> {
    let mut fields = vec![
        msg::HISTORICAL_DATA.to_string(),
        req_id.to_string(),
        start.to_string(),
        end.to_string(),
        bars.len().to_string(),
    ];
    for b in bars {
        fields.extend([
            b.date.clone(),
            b.open.to_string(),
            b.high.to_string(),
            b.low.to_string(),
            b.close.to_string(),
            b.volume.to_string(),
            ((b.high + b.low) / 2.0).to_string(),
            b.bar_count.to_string(),
        ]);
    }
    frame(fields)
}

/// A price tick with its size and attribute mask.
#[must_use]
pub fn tick_price(req_id: i64, tick_type: i32, price: f64, size: i64, attr_mask: i64) -> Vec<u8> {
    frame(vec![
        msg::TICK_PRICE.to_string(),
        "6".into(),
        req_id.to_string(),
        tick_type.to_string(),
        price.to_string(),
        size.to_string(),
        attr_mask.to_string(),
    ])
}

/// A size tick.
#[must_use]
pub fn tick_size(req_id: i64, tick_type: i32, size: i64) -> Vec<u8> {
    frame(vec![
        msg::TICK_SIZE.to_string(),
        "6".into(),
        req_id.to_string(),
        tick_type.to_string(),
        size.to_string(),
    ])
}

/// End of a market-data snapshot.
#[must_use]
pub fn tick_snapshot_end(req_id: i64) -> Vec<u8> {
    frame(vec![
        msg::TICK_SNAPSHOT_END.to_string(),
        "1".into(),
        req_id.to_string(),
    ])
}

/// Market data delivery mode.
#[must_use]
pub fn market_data_type(req_id: i64, code: i32) -> Vec<u8> {
    frame(vec![
        msg::MARKET_DATA_TYPE.to_string(),
        "1".into(),
        req_id.to_string(),
        code.to_string(),
    ])
}

/// The gateway's clock.
#[must_use]
pub fn current_time(time: i64) -> Vec<u8> {
    frame(vec![
        msg::CURRENT_TIME.to_string(),
        "1".into(),
        time.to_string(),
    ])
}

/// An error or notice.
#[must_use]
pub fn error(req_id: i64, code: i32, message: &str) -> Vec<u8> {
    frame(vec![
        msg::ERR_MSG.to_string(),
        "2".into(),
        req_id.to_string(),
        code.to_string(),
        message.to_string(),
    ])
}
