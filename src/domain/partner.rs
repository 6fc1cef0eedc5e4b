use crate::error::Code;
use chrono::NaiveDate;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Business rejection reported by a partner.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct PartnerError {
    pub code: String,
    pub message: String,
    pub grpc_code: Code,
}

impl PartnerError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            grpc_code: Code::Internal,
        }
    }

    pub fn with_grpc_code(mut self, grpc_code: Code) -> Self {
        self.grpc_code = grpc_code;
        self
    }
}

/// Where the control number of a disbursement comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlNoSource {
    /// Supplied by the caller, who got it from the remitter.
    Request,
    /// Synthesised locally, see [`generate_control_no`].
    Generated,
}

/// Static capabilities of a partner integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartnerProfile {
    pub code: &'static str,
    pub name: &'static str,
    pub prefix: &'static str,
    pub send: bool,
    pub disburse: bool,
    pub disburse_control_no: ControlNoSource,
}

/// The money-transfer networks reachable through the upstream gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partner {
    WesternUnion,
    Ria,
    Transfast,
    Cebuana,
    CebuanaIntl,
    Wise,
    IRemit,
    Remitly,
    Metrobank,
    Bpi,
    Ussc,
    InstaCash,
    JapanRemit,
    Uniteller,
    Ayannah,
    IntelExpress,
    PerahubRemit,
}

impl Partner {
    pub const ALL: [Partner; 17] = [
        Partner::WesternUnion,
        Partner::Ria,
        Partner::Transfast,
        Partner::Cebuana,
        Partner::CebuanaIntl,
        Partner::Wise,
        Partner::IRemit,
        Partner::Remitly,
        Partner::Metrobank,
        Partner::Bpi,
        Partner::Ussc,
        Partner::InstaCash,
        Partner::JapanRemit,
        Partner::Uniteller,
        Partner::Ayannah,
        Partner::IntelExpress,
        Partner::PerahubRemit,
    ];

    pub fn profile(self) -> PartnerProfile {
        use ControlNoSource::{Generated, Request};
        let (code, name, prefix, send, disburse, disburse_control_no) = match self {
            Partner::WesternUnion => ("WU", "Western Union", "WU", true, true, Request),
            Partner::Ria => ("RIA", "Ria Money Transfer", "RIA", false, true, Request),
            Partner::Transfast => ("TF", "Transfast", "TF", false, true, Request),
            Partner::Cebuana => ("CEB", "Cebuana Lhuillier", "CEB", true, true, Request),
            Partner::CebuanaIntl => ("CEBI", "Cebuana International", "CEBI", false, true, Request),
            Partner::Wise => ("WISE", "Wise", "WISE", true, false, Request),
            Partner::IRemit => ("IR", "iRemit", "IR", false, true, Request),
            Partner::Remitly => ("RM", "Remitly", "RM", false, true, Request),
            Partner::Metrobank => ("MB", "Metrobank", "MB", false, true, Request),
            Partner::Bpi => ("BPI", "BPI Direct Remit", "BPI", false, true, Request),
            Partner::Ussc => ("USSC", "USSC", "USSC", true, true, Request),
            Partner::InstaCash => ("IC", "InstaCash", "IC", false, true, Request),
            Partner::JapanRemit => ("JPR", "JapanRemit", "JPR", false, true, Request),
            Partner::Uniteller => ("UNT", "Uniteller", "UNT", false, true, Request),
            Partner::Ayannah => ("AYA", "Ayannah", "AYA", false, true, Request),
            Partner::IntelExpress => ("IE", "Intel Express", "IE", false, true, Request),
            Partner::PerahubRemit => ("PRH", "Perahub Remit", "PH", true, true, Generated),
        };
        PartnerProfile {
            code,
            name,
            prefix,
            send,
            disburse,
            disburse_control_no,
        }
    }

    pub fn code(self) -> &'static str {
        self.profile().code
    }

    pub fn from_code(code: &str) -> Option<Partner> {
        Self::ALL
            .into_iter()
            .find(|p| p.code().eq_ignore_ascii_case(code.trim()))
    }
}

/// Builds `<YYYYMMDD><prefix><9 random digits>`.
pub fn generate_control_no<R: Rng + ?Sized>(prefix: &str, date: NaiveDate, rng: &mut R) -> String {
    format!(
        "{}{}{:09}",
        date.format("%Y%m%d"),
        prefix,
        rng.gen_range(0..1_000_000_000u32)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    #[test]
    fn test_codes_are_unique_and_resolvable() {
        let codes: HashSet<_> = Partner::ALL.iter().map(|p| p.code()).collect();
        assert_eq!(codes.len(), Partner::ALL.len());
        for partner in Partner::ALL {
            assert_eq!(Partner::from_code(partner.code()), Some(partner));
        }
        assert_eq!(Partner::from_code("wu"), Some(Partner::WesternUnion));
        assert_eq!(Partner::from_code("XX"), None);
    }

    #[test]
    fn test_wise_cannot_disburse() {
        let wise = Partner::Wise.profile();
        assert!(wise.send);
        assert!(!wise.disburse);
    }

    #[test]
    fn test_generated_control_no_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let control_no = generate_control_no("PH", date, &mut rng);

        assert_eq!(control_no.len(), 8 + 2 + 9);
        assert!(control_no.starts_with("20240309PH"));
        assert!(control_no[10..].bytes().all(|b| b.is_ascii_digit()));
    }
}
