//! One handler per inbound message kind.

use chrono::DateTime;
use feedline_types::{
    Bar, ContractDetails, FeedlineError, Inbound, MarketDataType, NO_VALID_ID, QuoteRecord,
    RequestId, RequestKind, TickAttrib, TickType,
};

use crate::core::Client;

/// Gateway codes in this range are informational (farm status and the like).
const NOTICE_CODES: std::ops::RangeInclusive<i32> = 2100..=2199;

impl Client {
    /// Route one inbound message to its handler.
    ///
    /// Replies for ids the registry does not know are logged as warnings and
    /// otherwise ignored.
    ///
    /// # Errors
    /// Errors from sending follow-up requests or allocating ids; store
    /// failures are logged here and never returned.
    pub async fn dispatch(&mut self, msg: Inbound) -> Result<(), FeedlineError> {
        #[cfg(feature = "tracing")]
        tracing::trace!(kind = msg.kind(), "dispatch");
        match msg {
            Inbound::NextValidId { order_id } => self.on_next_valid_id(order_id).await,
            Inbound::ContractDetails { req_id, details } => {
                self.contract_details(req_id, details).await
            }
            Inbound::ContractDetailsEnd { req_id } => {
                self.contract_details_end(req_id);
                Ok(())
            }
            Inbound::HistoricalData { req_id, bar } => {
                self.historical_data(req_id, &bar).await;
                Ok(())
            }
            Inbound::HistoricalDataEnd { req_id, start, end } => {
                self.historical_data_end(req_id, &start, &end);
                Ok(())
            }
            Inbound::TickPrice {
                req_id,
                tick_type,
                price,
                attrib,
            } => {
                self.tick_price(req_id, tick_type, price, attrib);
                Ok(())
            }
            Inbound::TickSize {
                req_id,
                tick_type,
                size,
            } => {
                self.tick_size(req_id, tick_type, size);
                Ok(())
            }
            Inbound::TickSnapshotEnd { req_id } => {
                self.tick_snapshot_end(req_id);
                Ok(())
            }
            Inbound::MarketDataType { req_id, kind } => {
                self.market_data_type(req_id, kind);
                Ok(())
            }
            Inbound::CurrentTime { time } => {
                self.current_time(time);
                Ok(())
            }
            Inbound::Error {
                req_id,
                code,
                message,
            } => {
                self.gateway_error(req_id, code, &message);
                Ok(())
            }
        }
    }

    fn unknown(&self, kind: &str, req_id: RequestId) {
        self.ctx
            .log
            .warning(&format!("{kind} for unknown request id {req_id}"));
    }

    async fn contract_details(
        &mut self,
        req_id: RequestId,
        details: ContractDetails,
    ) -> Result<(), FeedlineError> {
        let table = self.registry.table(RequestKind::ContractLookup);
        let Some(requested) = table.get(req_id) else {
            self.unknown("contractDetails", req_id);
            return Ok(());
        };
        if !details.matches(&requested.instrument) {
            self.ctx.log.warning(&format!(
                "contractDetails {req_id}: {} / {} does not match requested {}",
                details.contract.symbol, details.market_name, requested.instrument.symbol
            ));
            return Ok(());
        }

        let validated = details.validated();
        self.ctx.log.info(&format!(
            "ContractDetails. ReqId: {req_id} {validated} market {}",
            details.market_name
        ));
        self.registry
            .table_mut(RequestKind::ContractLookup)
            .mark_answered(req_id);
        self.subscribe_validated(validated).await
    }

    fn contract_details_end(&mut self, req_id: RequestId) {
        let table = self.registry.table_mut(RequestKind::ContractLookup);
        let unanswered = table.is_pending(req_id);
        match table.remove(req_id) {
            Some(req) if unanswered => self.ctx.log.warning(&format!(
                "ContractDetailsEnd. ReqId: {req_id}: no matching contract for {}",
                req.instrument
            )),
            Some(_) => self
                .ctx
                .log
                .debug(&format!("ContractDetailsEnd. ReqId: {req_id}")),
            None => self.unknown("contractDetailsEnd", req_id),
        }
    }

    async fn historical_data(&mut self, req_id: RequestId, bar: &Bar) {
        let Some(req) = self
            .registry
            .table_mut(RequestKind::Historical)
            .mark_answered(req_id)
        else {
            self.unknown("historicalData", req_id);
            return;
        };
        let symbol = req.instrument.display_symbol().to_string();
        self.ctx
            .log
            .debug(&format!("HistoricalData. ReqId: {req_id} {symbol} {bar}"));

        let quote = match QuoteRecord::from_bar(symbol.as_str(), bar, self.cfg.source.as_str()) {
            Ok(q) => q,
            Err(e) => {
                self.ctx
                    .log
                    .error(&format!("quote {symbol} {}: {e}", bar.date));
                return;
            }
        };
        match self.ctx.store.upsert_quote(&quote).await {
            Ok(()) => {
                let pretty = serde_json::to_string_pretty(&quote).unwrap_or_default();
                self.ctx
                    .log
                    .debug(&format!("upserted into {}: {pretty}", self.ctx.store.name()));
            }
            Err(e) => self
                .ctx
                .log
                .error(&format!("upsert of {symbol} {} failed: {e}", bar.date)),
        }
    }

    fn historical_data_end(&mut self, req_id: RequestId, start: &str, end: &str) {
        match self.registry.table_mut(RequestKind::Historical).remove(req_id) {
            Some(req) => self.ctx.log.info(&format!(
                "HistoricalDataEnd. ReqId: {req_id} {} from {start} to {end}",
                req.instrument.display_symbol()
            )),
            None => self.unknown("historicalDataEnd", req_id),
        }
    }

    fn tick_price(&mut self, req_id: RequestId, tick_type: TickType, price: f64, attrib: TickAttrib) {
        let Some(req) = self
            .registry
            .table_mut(RequestKind::MarketData)
            .mark_answered(req_id)
        else {
            self.unknown("tickPrice", req_id);
            return;
        };
        self.ctx.log.info(&format!(
            "TickPrice. TickerId: {req_id} {} tickType: {tick_type} Price: {price} \
             CanAutoExecute: {} PastLimit: {} PreOpen: {}",
            req.instrument.display_symbol(),
            attrib.can_auto_execute,
            attrib.past_limit,
            attrib.pre_open
        ));
    }

    fn tick_size(&self, req_id: RequestId, tick_type: TickType, size: i64) {
        let Some(req) = self.registry.table(RequestKind::MarketData).get(req_id) else {
            self.unknown("tickSize", req_id);
            return;
        };
        self.ctx.log.info(&format!(
            "TickSize. TickerId: {req_id} {} tickType: {tick_type} Size: {size}",
            req.instrument.display_symbol()
        ));
    }

    fn tick_snapshot_end(&mut self, req_id: RequestId) {
        match self.registry.table_mut(RequestKind::MarketData).remove(req_id) {
            Some(req) => self.ctx.log.info(&format!(
                "TickSnapshotEnd. TickerId: {req_id} {}",
                req.instrument.display_symbol()
            )),
            None => self.unknown("tickSnapshotEnd", req_id),
        }
    }

    fn market_data_type(&self, req_id: RequestId, kind: MarketDataType) {
        self.ctx
            .log
            .info(&format!("MarketDataType. ReqId: {req_id} Type: {kind}"));
    }

    fn current_time(&self, time: i64) {
        let at = DateTime::from_timestamp(time, 0)
            .map_or_else(|| time.to_string(), |t| t.format("%Y%m%d %H:%M:%S").to_string());
        self.ctx.log.info(&format!("CurrentTime: {at}"));
    }

    fn gateway_error(&self, req_id: i64, code: i32, message: &str) {
        if NOTICE_CODES.contains(&code) {
            self.ctx.log.info(&format!("Notice {code}: {message}"));
        } else if req_id == NO_VALID_ID {
            self.ctx.log.error(&format!("Error {code}: {message}"));
        } else {
            self.ctx
                .log
                .error(&format!("Error. Id: {req_id} Code: {code} Msg: {message}"));
        }
    }
}
