//! Field-level codec for the gateway's message protocol.
//!
//! A frame on the wire is a 4-byte big-endian length followed by a payload of
//! NUL-terminated UTF-8 fields. The first field is the message id; the rest
//! follow a fixed layout per message kind. Only the kinds this client
//! exchanges are understood; any other inbound id decodes to no messages.

use feedline_types::{
    Bar, ContractDetails, DEFAULT_MAX_FRAME_LEN, FeedlineError, Inbound, InstrumentDescriptor,
    MarketDataType, OutboundRequest, ProductType, RequestId, TickAttrib, TickType,
};

/// Largest payload accepted in one frame.
pub const MAX_FRAME_LEN: usize = DEFAULT_MAX_FRAME_LEN;

/// Length of the frame header carrying the payload length.
pub const HEADER_LEN: usize = 4;

/// Message ids on the wire.
pub mod msg {
    /// Inbound: price tick.
    pub const TICK_PRICE: i32 = 1;
    /// Inbound: size tick.
    pub const TICK_SIZE: i32 = 2;
    /// Inbound: error or notice.
    pub const ERR_MSG: i32 = 4;
    /// Inbound: next valid id.
    pub const NEXT_VALID_ID: i32 = 9;
    /// Inbound: contract details.
    pub const CONTRACT_DATA: i32 = 10;
    /// Inbound: historical bars.
    pub const HISTORICAL_DATA: i32 = 17;
    /// Inbound: server clock.
    pub const CURRENT_TIME: i32 = 49;
    /// Inbound: end of contract details.
    pub const CONTRACT_DATA_END: i32 = 52;
    /// Inbound: end of a market-data snapshot.
    pub const TICK_SNAPSHOT_END: i32 = 57;
    /// Inbound: market data delivery mode.
    pub const MARKET_DATA_TYPE: i32 = 58;

    /// Outbound: market data request.
    pub const REQ_MKT_DATA: i32 = 1;
    /// Outbound: contract details request.
    pub const REQ_CONTRACT_DATA: i32 = 9;
    /// Outbound: historical data request.
    pub const REQ_HISTORICAL_DATA: i32 = 20;
    /// Outbound: server clock request.
    pub const REQ_CURRENT_TIME: i32 = 49;
    /// Outbound: API start after connecting.
    pub const START_API: i32 = 71;
}

/// Split a frame payload into its fields.
///
/// The terminator of the last field does not produce an extra empty field.
///
/// # Errors
/// Returns `FeedlineError::Malformed` if the payload is not UTF-8.
pub fn read_fields(frame: &[u8]) -> Result<Vec<String>, FeedlineError> {
    let text = std::str::from_utf8(frame)
        .map_err(|e| FeedlineError::malformed(format!("frame is not utf-8: {e}")))?;
    let mut fields: Vec<String> = text.split('\0').map(str::to_owned).collect();
    if fields.last().is_some_and(String::is_empty) {
        fields.pop();
    }
    Ok(fields)
}

/// Join fields into a frame payload, terminating each with a NUL.
pub fn encode_fields<I, S>(fields: I) -> Vec<u8>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = Vec::new();
    for field in fields {
        out.extend_from_slice(field.as_ref().as_bytes());
        out.push(0);
    }
    out
}

/// Reject payloads longer than `max_len`.
///
/// # Errors
/// Returns `FeedlineError::OversizedFrame` when `len > max_len`.
pub fn check_frame_len(len: usize, max_len: usize) -> Result<(), FeedlineError> {
    if len > max_len {
        return Err(FeedlineError::OversizedFrame { len, max: max_len });
    }
    Ok(())
}

/// Prefix a payload with its length header.
///
/// # Errors
/// Returns `FeedlineError::OversizedFrame` if the payload exceeds [`MAX_FRAME_LEN`].
pub fn frame(payload: &[u8]) -> Result<Vec<u8>, FeedlineError> {
    check_frame_len(payload.len(), MAX_FRAME_LEN)?;
    let len = u32::try_from(payload.len()).map_err(|_| FeedlineError::OversizedFrame {
        len: payload.len(),
        max: MAX_FRAME_LEN,
    })?;
    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(payload);
    Ok(out)
}

/// Payload length announced by a frame header.
#[must_use]
pub const fn frame_len(header: [u8; HEADER_LEN]) -> usize {
    u32::from_be_bytes(header) as usize
}

/// Turns field lists into typed inbound messages.
pub trait Decoder: Send + Sync {
    /// Interpret one frame's fields.
    ///
    /// A single frame may carry several messages (a historical pull carries
    /// every bar plus its end marker). Unknown message ids yield an empty list.
    ///
    /// # Errors
    /// Returns `FeedlineError::Malformed` if a known message is missing a field
    /// or a field does not parse.
    fn interpret(&self, fields: &[String]) -> Result<Vec<Inbound>, FeedlineError>;
}

/// Turns typed outbound requests into field lists.
pub trait Encoder: Send + Sync {
    /// Encode one request.
    fn encode(&self, request: &OutboundRequest) -> Vec<String>;
}

/// Codec for the fixed field layouts of the messages this client uses.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldCodec;

impl FieldCodec {
    /// Fields of the start-API message sent right after connecting.
    #[must_use]
    pub fn start_api(client_id: i32) -> Vec<String> {
        vec![
            msg::START_API.to_string(),
            "2".into(),
            client_id.to_string(),
            String::new(),
        ]
    }
}

struct Cursor<'a> {
    msg_id: i32,
    fields: std::slice::Iter<'a, String>,
}

impl<'a> Cursor<'a> {
    fn next(&mut self, name: &str) -> Result<&'a str, FeedlineError> {
        self.fields.next().map(String::as_str).ok_or_else(|| {
            FeedlineError::malformed(format!("message {}: missing field `{name}`", self.msg_id))
        })
    }

    fn skip(&mut self, name: &str) -> Result<(), FeedlineError> {
        self.next(name).map(|_| ())
    }

    fn string(&mut self, name: &str) -> Result<String, FeedlineError> {
        self.next(name).map(str::to_owned)
    }

    fn parse<T>(&mut self, name: &str) -> Result<T, FeedlineError>
    where
        T: std::str::FromStr + Default,
        T::Err: core::fmt::Display,
    {
        let raw = self.next(name)?;
        if raw.is_empty() {
            return Ok(T::default());
        }
        raw.parse().map_err(|e| {
            FeedlineError::malformed(format!(
                "message {}: field `{name}` = {raw:?}: {e}",
                self.msg_id
            ))
        })
    }

    fn req_id(&mut self) -> Result<RequestId, FeedlineError> {
        self.parse("reqId").map(RequestId)
    }
}

fn size_tick_for(price_tick: TickType) -> Option<TickType> {
    match price_tick {
        TickType::BID => Some(TickType::BID_SIZE),
        TickType::ASK => Some(TickType::ASK_SIZE),
        TickType::LAST => Some(TickType::LAST_SIZE),
        _ => None,
    }
}

impl Decoder for FieldCodec {
    fn interpret(&self, fields: &[String]) -> Result<Vec<Inbound>, FeedlineError> {
        let Some(first) = fields.first() else {
            return Err(FeedlineError::malformed("empty frame"));
        };
        let msg_id: i32 = first
            .parse()
            .map_err(|e| FeedlineError::malformed(format!("message id {first:?}: {e}")))?;
        let mut c = Cursor {
            msg_id,
            fields: fields[1..].iter(),
        };

        let out = match msg_id {
            msg::TICK_PRICE => {
                c.skip("version")?;
                let req_id = c.req_id()?;
                let tick_type = TickType(c.parse("tickType")?);
                let price: f64 = c.parse("price")?;
                let size: i64 = c.parse("size")?;
                let attrib = TickAttrib::from_mask(c.parse("attrMask")?);
                let mut out = vec![Inbound::TickPrice {
                    req_id,
                    tick_type,
                    price,
                    attrib,
                }];
                if let Some(size_type) = size_tick_for(tick_type) {
                    out.push(Inbound::TickSize {
                        req_id,
                        tick_type: size_type,
                        size,
                    });
                }
                out
            }
            msg::TICK_SIZE => {
                c.skip("version")?;
                vec![Inbound::TickSize {
                    req_id: c.req_id()?,
                    tick_type: TickType(c.parse("tickType")?),
                    size: c.parse("size")?,
                }]
            }
            msg::ERR_MSG => {
                c.skip("version")?;
                vec![Inbound::Error {
                    req_id: c.parse("reqId")?,
                    code: c.parse("code")?,
                    message: c.string("message")?,
                }]
            }
            msg::NEXT_VALID_ID => {
                c.skip("version")?;
                vec![Inbound::NextValidId {
                    order_id: c.parse("orderId")?,
                }]
            }
            msg::CONTRACT_DATA => {
                c.skip("version")?;
                let req_id = c.req_id()?;
                let symbol = c.string("symbol")?;
                let product_type = ProductType::from_code(c.next("secType")?);
                let contract_month = c.string("contractMonth")?;
                let venue = c.string("exchange")?;
                let local_symbol = c.string("localSymbol")?;
                let market_name = c.string("marketName")?;
                let trading_class = c.string("tradingClass")?;
                vec![Inbound::ContractDetails {
                    req_id,
                    details: ContractDetails {
                        contract: InstrumentDescriptor {
                            symbol,
                            product_type,
                            venue,
                            trading_class,
                            contract_month,
                            local_symbol,
                        },
                        market_name,
                    },
                }]
            }
            msg::HISTORICAL_DATA => {
                let req_id = c.req_id()?;
                let start = c.string("startDate")?;
                let end = c.string("endDate")?;
                let count: usize = c.parse("itemCount")?;
                let mut out = Vec::with_capacity(count.min(fields.len()) + 1);
                for _ in 0..count {
                    let date = c.string("date")?;
                    let open = c.parse("open")?;
                    let high = c.parse("high")?;
                    let low = c.parse("low")?;
                    let close = c.parse("close")?;
                    let volume = c.parse("volume")?;
                    c.skip("wap")?;
                    let bar_count = c.parse("barCount")?;
                    out.push(Inbound::HistoricalData {
                        req_id,
                        bar: Bar {
                            date,
                            open,
                            high,
                            low,
                            close,
                            volume,
                            bar_count,
                        },
                    });
                }
                out.push(Inbound::HistoricalDataEnd { req_id, start, end });
                out
            }
            msg::CURRENT_TIME => {
                c.skip("version")?;
                vec![Inbound::CurrentTime {
                    time: c.parse("time")?,
                }]
            }
            msg::CONTRACT_DATA_END => {
                c.skip("version")?;
                vec![Inbound::ContractDetailsEnd {
                    req_id: c.req_id()?,
                }]
            }
            msg::TICK_SNAPSHOT_END => {
                c.skip("version")?;
                vec![Inbound::TickSnapshotEnd {
                    req_id: c.req_id()?,
                }]
            }
            msg::MARKET_DATA_TYPE => {
                c.skip("version")?;
                let req_id = c.req_id()?;
                let code: i32 = c.parse("marketDataType")?;
                vec![Inbound::MarketDataType {
                    req_id,
                    kind: MarketDataType::from(code),
                }]
            }
            _ => {
                #[cfg(feature = "tracing")]
                tracing::trace!(msg_id, "ignoring unhandled message id");
                Vec::new()
            }
        };
        Ok(out)
    }
}

fn flag(value: bool) -> String {
    if value { "1" } else { "0" }.to_string()
}

fn contract_fields(out: &mut Vec<String>, instrument: &InstrumentDescriptor) {
    out.extend([
        instrument.symbol.clone(),
        instrument.product_type.code().to_string(),
        instrument.contract_month.clone(),
        instrument.venue.clone(),
        instrument.local_symbol.clone(),
        instrument.trading_class.clone(),
    ]);
}

impl Encoder for FieldCodec {
    fn encode(&self, request: &OutboundRequest) -> Vec<String> {
        match request {
            OutboundRequest::ContractDetails { id, instrument } => {
                let mut out = vec![msg::REQ_CONTRACT_DATA.to_string(), "8".into(), id.to_string()];
                contract_fields(&mut out, instrument);
                out
            }
            OutboundRequest::MarketData {
                id,
                instrument,
                params,
            } => {
                let mut out = vec![msg::REQ_MKT_DATA.to_string(), "11".into(), id.to_string()];
                contract_fields(&mut out, instrument);
                out.extend([
                    params.generic_ticks.clone(),
                    flag(params.snapshot),
                    flag(params.regulatory_snapshot),
                    String::new(),
                ]);
                out
            }
            OutboundRequest::HistoricalData {
                id,
                instrument,
                params,
            } => {
                let mut out = vec![msg::REQ_HISTORICAL_DATA.to_string(), id.to_string()];
                contract_fields(&mut out, instrument);
                out.extend([
                    params.end_date_time.clone(),
                    params.bar_size.clone(),
                    params.duration.clone(),
                    flag(params.use_rth),
                    params.what_to_show.clone(),
                    params.format_date.to_string(),
                    flag(params.keep_up_to_date),
                    String::new(),
                ]);
                out
            }
            OutboundRequest::CurrentTime => {
                vec![msg::REQ_CURRENT_TIME.to_string(), "1".into()]
            }
        }
    }
}
