use crate::domain::money::Money;
use crate::domain::remittance::{Remittance, TransactionDetails, UserKyc};
use crate::error::MoneyError;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    StageSend,
    StageDisburse,
    Confirm,
}

/// One line of a remit requests file. Amounts are decimal strings in major
/// units; `confirm` lines reference an earlier stage line by `dsa_order_id`.
#[derive(Debug, Deserialize, PartialEq, Eq, Clone)]
pub struct RemitRequestRecord {
    pub action: Action,
    pub partner: String,
    pub dsa_order_id: String,
    #[serde(default)]
    pub dsa_id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub control_no: String,
    #[serde(default)]
    pub remitter_first: String,
    #[serde(default)]
    pub remitter_last: String,
    #[serde(default)]
    pub receiver_first: String,
    #[serde(default)]
    pub receiver_last: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub dest_amount: String,
    #[serde(default)]
    pub dest_currency: String,
    #[serde(default)]
    pub source_country: String,
    #[serde(default)]
    pub dest_country: String,
}

impl RemitRequestRecord {
    /// Builds the normalized envelope. Destination amount and currency
    /// default to the source ones.
    pub fn to_remittance(&self) -> Result<Remittance, MoneyError> {
        let source_amt = Money::parse_major(&self.amount, &self.currency)?;
        let dest_currency = if self.dest_currency.is_empty() {
            &self.currency
        } else {
            &self.dest_currency
        };
        let dest_amt = if self.dest_amount.is_empty() {
            Money::parse_major(&self.amount, dest_currency)?
        } else {
            Money::parse_major(&self.dest_amount, dest_currency)?
        };

        let mut remitter = UserKyc::default();
        remitter.name.first = self.remitter_first.clone();
        remitter.name.last = self.remitter_last.clone();
        let mut receiver = UserKyc::default();
        receiver.name.first = self.receiver_first.clone();
        receiver.name.last = self.receiver_last.clone();

        Ok(Remittance {
            remitter,
            receiver,
            source_amt,
            dest_amt,
            txn: TransactionDetails {
                is_domestic: self.source_country == self.dest_country,
                source_country: self.source_country.clone(),
                dest_country: self.dest_country.clone(),
                purpose: String::new(),
            },
            agent: Default::default(),
            control_no: self.control_no.clone(),
            dsa_id: self.dsa_id.clone(),
            dsa_order_id: self.dsa_order_id.clone(),
            user_id: self.user_id.clone(),
            remit_partner: self.partner.clone(),
            send_remit_type: Default::default(),
        })
    }
}

/// Reads remit requests from a CSV source.
///
/// Wraps `csv::Reader`, trimming whitespace and tolerating short records so
/// `confirm` lines can omit the amount columns.
pub struct RequestReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> RequestReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily deserializes requests, one `Result` per line.
    pub fn requests(self) -> impl Iterator<Item = csv::Result<RemitRequestRecord>> {
        self.reader.into_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "action,partner,dsa_order_id,dsa_id,user_id,control_no,remitter_first,remitter_last,receiver_first,receiver_last,amount,currency";

    #[test]
    fn test_reader_valid_stream() {
        let data = format!(
            "{HEADER}\nstage-send, WU, O1, DSA1, u1, , Maria, Santos, Jose, Rizal, 1000.50, PHP\nconfirm, WU, O1"
        );
        let reader = RequestReader::new(data.as_bytes());
        let results: Vec<_> = reader.requests().collect();

        assert_eq!(results.len(), 2);
        let send = results[0].as_ref().unwrap();
        assert_eq!(send.action, Action::StageSend);
        assert_eq!(send.amount, "1000.50");
        let confirm = results[1].as_ref().unwrap();
        assert_eq!(confirm.action, Action::Confirm);
        assert_eq!(confirm.dsa_order_id, "O1");
        assert!(confirm.amount.is_empty());
    }

    #[test]
    fn test_reader_malformed_line() {
        let data = format!("{HEADER}\nrefund, WU, O1");
        let reader = RequestReader::new(data.as_bytes());
        let results: Vec<_> = reader.requests().collect();

        assert!(results[0].is_err());
    }

    #[test]
    fn test_to_remittance_defaults_destination() {
        let data = format!(
            "{HEADER}\nstage-disburse, WU, O1, DSA1, u1, CTRL1, Maria, Santos, Jose, Rizal, 250, PHP"
        );
        let record = RequestReader::new(data.as_bytes())
            .requests()
            .next()
            .unwrap()
            .unwrap();
        let remit = record.to_remittance().unwrap();

        assert_eq!(remit.source_amt.minor_units(), 25000);
        assert_eq!(remit.dest_amt, remit.source_amt);
        assert_eq!(remit.control_no, "CTRL1");
        assert_eq!(remit.receiver.name.full(), "Jose Rizal");
    }

    #[test]
    fn test_to_remittance_rejects_bad_amount() {
        let data = format!("{HEADER}\nstage-send, WU, O1, , , , , , , , 1.005, PHP");
        let record = RequestReader::new(data.as_bytes())
            .requests()
            .next()
            .unwrap()
            .unwrap();
        assert!(matches!(
            record.to_remittance(),
            Err(MoneyError::Precision { .. })
        ));
    }
}
