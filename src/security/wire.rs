use super::errors::{Result, SecurityError};
use super::keys::SecurityKeys;
use super::option::SignedOption;
use super::{DEFAULT_MAX_QUESTIONS, DEFAULT_REPLAY_WINDOW, TIMESTAMP_RECORD_NAME, TIMESTAMP_TTL};
use crate::dns::DNSPacket;
use crate::dns::edns::SIGNED_OPTION_CODE;
use crate::dns::enums::{DNSResourceType, ResponseCode};
use crate::dns::resource::DNSResource;
use chrono::Utc;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Request validation, response signing and poisoning checks for DNS messages
#[derive(Debug, Clone)]
pub struct WireSecurity {
    keys: Option<SecurityKeys>,
    replay_window: Duration,
    max_questions: usize,
}

impl WireSecurity {
    pub fn new(keys: Option<SecurityKeys>) -> Self {
        Self::with_limits(keys, DEFAULT_REPLAY_WINDOW, DEFAULT_MAX_QUESTIONS)
    }

    pub fn with_limits(
        keys: Option<SecurityKeys>,
        replay_window: Duration,
        max_questions: usize,
    ) -> Self {
        Self {
            keys,
            replay_window,
            max_questions,
        }
    }

    pub fn keys(&self) -> Option<&SecurityKeys> {
        self.keys.as_ref()
    }

    pub fn replay_window(&self) -> Duration {
        self.replay_window
    }

    pub fn max_questions(&self) -> usize {
        self.max_questions
    }

    /// Fails closed; an absent signed option is valid
    pub fn validate_request(&self, request: &DNSPacket) -> bool {
        match self.check_request(request) {
            Ok(()) => true,
            Err(e) => {
                debug!("Rejecting request {}: {}", request.header.id, e);
                false
            }
        }
    }

    pub fn check_request(&self, request: &DNSPacket) -> Result<()> {
        if request.questions.is_empty() {
            return Err(SecurityError::NoQuestions);
        }
        if request.questions.len() > self.max_questions {
            return Err(SecurityError::TooManyQuestions {
                count: request.questions.len(),
                max: self.max_questions,
            });
        }

        let Some(data) = signed_option_data(request) else {
            return Ok(());
        };
        let keys = self.keys.as_ref().ok_or(SecurityError::MissingKeys)?;
        self.verify_option(keys, data, |ts| question_payload(request, ts))
    }

    /// Attach a signed option over the question section
    pub fn sign_request(&self, request: &mut DNSPacket) -> Result<()> {
        self.sign_request_at(request, now_ms())
    }

    pub fn sign_request_at(&self, request: &mut DNSPacket, timestamp_ms: i64) -> Result<()> {
        let Some(keys) = &self.keys else {
            return Ok(());
        };
        let payload = question_payload(request, timestamp_ms);
        attach_signature(keys, request, &payload, timestamp_ms)
    }

    /// Attach a signed option over the answer section; no-op without keys
    pub fn sign_response(&self, response: &mut DNSPacket) -> Result<()> {
        self.sign_response_at(response, now_ms())
    }

    pub fn sign_response_at(&self, response: &mut DNSPacket, timestamp_ms: i64) -> Result<()> {
        let Some(keys) = &self.keys else {
            return Ok(());
        };
        let payload = answer_payload(response, timestamp_ms);
        attach_signature(keys, response, &payload, timestamp_ms)?;
        trace!(
            "Signed response {} over {} answers",
            response.header.id,
            response.answers.len()
        );
        Ok(())
    }

    /// Verify the signed option of a response; unsigned responses fail
    pub fn verify_response(&self, response: &DNSPacket) -> bool {
        match self.check_response(response) {
            Ok(()) => true,
            Err(e) => {
                debug!("Response {} failed verification: {}", response.header.id, e);
                false
            }
        }
    }

    pub fn check_response(&self, response: &DNSPacket) -> Result<()> {
        let data = signed_option_data(response).ok_or(SecurityError::Unsigned)?;
        let keys = self.keys.as_ref().ok_or(SecurityError::MissingKeys)?;
        self.verify_option(keys, data, |ts| answer_payload(response, ts))
    }

    /// False when `response` does not plausibly answer `request`
    pub fn detect_cache_poisoning(&self, request: &DNSPacket, response: &DNSPacket) -> bool {
        match check_cache_poisoning(request, response) {
            Ok(()) => true,
            Err(e) => {
                warn!("{}", e);
                false
            }
        }
    }

    /// Final response for `request`. Invalid requests get a minimal SERVFAIL,
    /// mismatched responses are stripped to SERVFAIL, anything else is marked
    /// authenticated, timestamped and signed.
    pub fn create_secure_response(&self, request: &DNSPacket, mut response: DNSPacket) -> DNSPacket {
        if !self.validate_request(request) {
            return server_failure(request);
        }

        if !self.detect_cache_poisoning(request, &response) {
            response.set_rcode(ResponseCode::ServerFailure);
            response.answers.clear();
            response.authorities.clear();
            response.resources.clear();
            response.header.set_authenticated_data(false);
            response.sync_counts();
            return response;
        }

        let timestamp_ms = now_ms();
        response.header.set_authenticated_data(true);
        response.resources.push(DNSResource::txt(
            TIMESTAMP_RECORD_NAME,
            TIMESTAMP_TTL,
            &timestamp_ms.to_string(),
        ));

        if let Err(e) = self.sign_response_at(&mut response, timestamp_ms) {
            warn!("Failed to sign response {}: {}", response.header.id, e);
            return server_failure(request);
        }

        response.sync_counts();
        response
    }

    fn verify_option<F>(&self, keys: &SecurityKeys, data: &[u8], payload: F) -> Result<()>
    where
        F: FnOnce(i64) -> String,
    {
        let option = SignedOption::decode(data)?;
        let timestamp_ms = option.timestamp_ms()?;

        let Some(age_ms) = now_ms().checked_sub(timestamp_ms) else {
            return Err(SecurityError::Expired { age_ms: i64::MAX });
        };
        if age_ms.unsigned_abs() > self.replay_window.as_millis() as u64 {
            return Err(SecurityError::Expired { age_ms });
        }

        let signature = option.signature_bytes()?;
        if !keys.verify(payload(timestamp_ms).as_bytes(), &signature) {
            return Err(SecurityError::BadSignature);
        }
        Ok(())
    }
}

/// Id must match and every non-NS question needs a matching answer
pub fn check_cache_poisoning(request: &DNSPacket, response: &DNSPacket) -> Result<()> {
    if request.header.id != response.header.id {
        return Err(SecurityError::PoisoningDetected(format!(
            "response id {} does not match request id {}",
            response.header.id, request.header.id
        )));
    }

    for question in &request.questions {
        if question.qtype == DNSResourceType::NS {
            continue;
        }
        let name = question.name();
        let answered = response.answers.iter().any(|answer| {
            answer.name() == name
                && (question.qtype == DNSResourceType::ANY || answer.rtype == question.qtype)
        });
        if !answered {
            return Err(SecurityError::PoisoningDetected(format!(
                "no {} answer for {}",
                question.qtype, name
            )));
        }
    }
    Ok(())
}

/// Minimal SERVFAIL reply: request id and echoed questions only
pub fn server_failure(request: &DNSPacket) -> DNSPacket {
    let mut response = DNSPacket::response_to(request);
    response.set_rcode(ResponseCode::ServerFailure);
    response
}

/// `name|TYPE|CLASS` per question, `;`-joined, then `:<timestamp>`
pub fn question_payload(packet: &DNSPacket, timestamp_ms: i64) -> String {
    let questions: Vec<String> = packet
        .questions
        .iter()
        .map(|q| format!("{}|{}|{}", q.name(), q.qtype, q.qclass))
        .collect();
    format!("{}:{}", questions.join(";"), timestamp_ms)
}

/// `name|TYPE|ttl|rdata` per answer, `;`-joined, then `:<timestamp>`
pub fn answer_payload(packet: &DNSPacket, timestamp_ms: i64) -> String {
    let answers: Vec<String> = packet
        .answers
        .iter()
        .map(|a| format!("{}|{}|{}|{}", a.name(), a.rtype, a.ttl, a.presentation_rdata()))
        .collect();
    format!("{}:{}", answers.join(";"), timestamp_ms)
}

fn signed_option_data(packet: &DNSPacket) -> Option<&[u8]> {
    packet
        .edns
        .as_ref()?
        .find_option(SIGNED_OPTION_CODE)
        .map(|opt| opt.data.as_slice())
}

fn attach_signature(
    keys: &SecurityKeys,
    packet: &mut DNSPacket,
    payload: &str,
    timestamp_ms: i64,
) -> Result<()> {
    let signature = keys.sign(payload.as_bytes())?;
    let option = SignedOption::new(&signature, timestamp_ms, keys.algorithm());
    packet
        .edns_mut()
        .set_option(SIGNED_OPTION_CODE, option.encode()?);
    packet.sync_counts();
    Ok(())
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}
