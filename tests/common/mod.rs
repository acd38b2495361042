#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use time::OffsetDateTime;
use tokenverifier::{CertificateFetcher, CertificateResponse, Clock, FetchError};

pub const SIGNING_CERT_1: &str = include_str!("../testdata/signing-cert-1.pem");
pub const SIGNING_CERT_2: &str = include_str!("../testdata/signing-cert-2.pem");
pub const SIGNING_CERT_EC: &str = include_str!("../testdata/signing-cert-ec.pem");
pub const SIGNING_KEY_1: &str = include_str!("../testdata/signing-key-1.pem");
pub const SIGNING_KEY_2: &str = include_str!("../testdata/signing-key-2.pem");
pub const SIGNING_KEY_EC: &str = include_str!("../testdata/signing-key-ec.pem");
pub const PROVIDER_RESPONSE: &[u8] = include_bytes!("../testdata/provider-certificates.json");

/// Provider listing body holding `pems` in order.
pub fn provider_body(pems: &[&str]) -> Vec<u8> {
    let certificates: Vec<_> = pems
        .iter()
        .map(|pem| serde_json::json!({ "encoded": pem }))
        .collect();
    serde_json::to_vec(&serde_json::json!([{ "certificates": certificates }])).unwrap()
}

#[derive(Debug, Clone)]
pub enum Reply {
    Ok {
        body: Vec<u8>,
        cache_control: Option<String>,
    },
    Status(u16),
}

impl Reply {
    pub fn ok(body: impl Into<Vec<u8>>, cache_control: Option<&str>) -> Self {
        Self::Ok {
            body: body.into(),
            cache_control: cache_control.map(str::to_owned),
        }
    }
}

/// Fetcher answering every request with the current reply and counting calls.
#[derive(Debug)]
pub struct FakeFetcher {
    reply: Mutex<Reply>,
    calls: AtomicUsize,
}

impl FakeFetcher {
    pub fn new(reply: Reply) -> Self {
        Self {
            reply: Mutex::new(reply),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_reply(&self, reply: Reply) {
        *self.reply.lock().unwrap() = reply;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CertificateFetcher for FakeFetcher {
    fn fetch(&self) -> Result<CertificateResponse, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.reply.lock().unwrap().clone() {
            Reply::Ok {
                body,
                cache_control,
            } => Ok(CertificateResponse {
                body,
                cache_control,
            }),
            Reply::Status(status) => Err(FetchError::Status { status }),
        }
    }

    fn endpoint(&self) -> &str {
        "fake://certificates"
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock(Mutex<OffsetDateTime>);

impl ManualClock {
    pub fn at(unix_timestamp: i64) -> Self {
        Self(Mutex::new(
            OffsetDateTime::from_unix_timestamp(unix_timestamp).unwrap(),
        ))
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.0.lock().unwrap();
        *now += by;
    }

    pub fn unix_timestamp(&self) -> i64 {
        self.0.lock().unwrap().unix_timestamp()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> OffsetDateTime {
        *self.0.lock().unwrap()
    }
}
