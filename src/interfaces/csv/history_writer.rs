use crate::domain::history::RemitHistory;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
struct HistoryRecord<'a> {
    txn_id: String,
    partner: &'a str,
    control_no: &'a str,
    dsa_order_id: &'a str,
    rem_type: &'static str,
    txn_step: &'static str,
    txn_status: &'static str,
    error_code: &'a str,
    error_type: &'static str,
    source_amount: String,
    gross_total: String,
    currency: &'a str,
}

impl<'a> From<&'a RemitHistory> for HistoryRecord<'a> {
    fn from(row: &'a RemitHistory) -> Self {
        let snapshot = &row.remittance;
        Self {
            txn_id: row.txn_id.to_string(),
            partner: &row.remco_id,
            control_no: &row.remco_control_no,
            dsa_order_id: &row.dsa_order_id,
            rem_type: row.rem_type.as_str(),
            txn_step: row.txn_step.as_str(),
            txn_status: row.txn_status.as_str(),
            error_code: &row.error_code,
            error_type: row.error_type.map_or("", |t| t.as_str()),
            source_amount: snapshot.source_amt.to_decimal().to_string(),
            gross_total: snapshot.gross_total.to_decimal().to_string(),
            currency: snapshot.source_amt.currency_code(),
        }
    }
}

/// Writes remit history rows as CSV, one line per (transaction, step).
pub struct HistoryWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> HistoryWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_history<'a, I>(&mut self, rows: I) -> csv::Result<()>
    where
        I: IntoIterator<Item = &'a RemitHistory>,
    {
        for row in rows {
            self.writer.serialize(HistoryRecord::from(row))?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
