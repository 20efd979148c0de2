//! Authoritative DNS response generation
//!
//! Answers pre-parsed queries from the zone store and passes every response
//! through the wire security layer.

use super::ZoneStore;
use crate::dns::DNSPacket;
use crate::dns::edns::EdnsOpt;
use crate::dns::enums::ResponseCode;
use crate::security::{WireSecurity, server_failure};
use std::sync::Arc;
use tracing::{debug, warn};

/// Authoritative DNS responder
pub struct AuthoritativeResponder {
    zone_store: Arc<ZoneStore>,
    security: Arc<WireSecurity>,
}

impl AuthoritativeResponder {
    pub fn new(zone_store: Arc<ZoneStore>, security: Arc<WireSecurity>) -> Self {
        Self {
            zone_store,
            security,
        }
    }

    pub fn security(&self) -> &WireSecurity {
        &self.security
    }

    /// Build the secured response to `query`
    pub async fn respond(&self, query: &DNSPacket) -> DNSPacket {
        if !self.security.validate_request(query) {
            return server_failure(query);
        }

        // Only standard queries are served
        if query.header.opcode != 0 {
            let mut response = DNSPacket::response_to(query);
            response.set_rcode(ResponseCode::NotImplemented);
            return response;
        }

        let response = self.answer(query).await;
        self.security.create_secure_response(query, response)
    }

    /// Unsecured answer built from zone data
    pub async fn answer(&self, query: &DNSPacket) -> DNSPacket {
        let mut response = DNSPacket::response_to(query);
        response.header.aa = true;
        if let Some(edns) = &query.edns {
            response.edns = Some(EdnsOpt::with_payload_size(edns.udp_payload_size));
        }

        let default_ttl = self.zone_store.options().default_ttl;
        for question in &query.questions {
            let qname = question.name();
            let records = match self.zone_store.lookup(&qname, question.qtype.as_str()).await {
                Ok(records) => records,
                Err(e) => {
                    warn!("Lookup failed for {} {}: {}", qname, question.qtype, e);
                    let mut failure = server_failure(query);
                    failure.header.aa = true;
                    return failure;
                }
            };

            debug!("Found {} records for {} {}", records.len(), qname, question.qtype);
            for record in records {
                match record.to_dns_resource(&qname, default_ttl) {
                    Ok(resource) => response.answers.push(resource),
                    Err(e) => debug!("Skipping {} {}: {}", record.domain, record.rtype, e),
                }
            }
        }

        response.sync_counts();
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::enums::DNSResourceType;
    use crate::security::SecurityKeys;
    use crate::shard::ShardCodec;
    use crate::zone::NewRecord;
    use crate::zone::backend::MemoryBackend;
    use crate::zone::store::StoreOptions;

    async fn responder() -> AuthoritativeResponder {
        let store = ZoneStore::new(
            Arc::new(MemoryBackend::new()),
            ShardCodec::default(),
            StoreOptions::default(),
        );
        store.create_zone("example").await.unwrap();
        store
            .add_record("example", NewRecord::new("www", "A", "192.0.2.10").with_ttl(600))
            .await
            .unwrap();
        store
            .add_record("example", NewRecord::new("*", "TXT", "catch-all"))
            .await
            .unwrap();

        let security = WireSecurity::new(Some(SecurityKeys::generate().unwrap()));
        AuthoritativeResponder::new(Arc::new(store), Arc::new(security))
    }

    #[tokio::test]
    async fn test_answers_from_shards() {
        let responder = responder().await;
        let query = DNSPacket::query(77, "www.example", DNSResourceType::A);
        let response = responder.respond(&query).await;

        assert_eq!(response.header.id, 77);
        assert!(response.header.aa);
        assert!(response.header.authenticated_data());
        assert_eq!(response.rcode(), Some(ResponseCode::NoError));
        assert_eq!(response.answers.len(), 1);
        assert_eq!(response.answers[0].rdata, vec![192, 0, 2, 10]);
        assert_eq!(response.answers[0].ttl, 600);
        assert!(responder.security().verify_response(&response));
    }

    #[tokio::test]
    async fn test_wildcard_answer_uses_query_name() {
        let responder = responder().await;
        let query = DNSPacket::query(78, "anything.example", DNSResourceType::TXT);
        let response = responder.respond(&query).await;

        assert_eq!(response.answers.len(), 1);
        assert_eq!(response.answers[0].name(), "anything.example");
    }

    #[tokio::test]
    async fn test_unanswered_query_is_servfail() {
        let responder = responder().await;
        let query = DNSPacket::query(79, "missing.example", DNSResourceType::AAAA);
        let response = responder.respond(&query).await;

        assert_eq!(response.rcode(), Some(ResponseCode::ServerFailure));
        assert!(response.answers.is_empty());
    }

    #[tokio::test]
    async fn test_non_query_opcode() {
        let responder = responder().await;
        let mut query = DNSPacket::query(80, "www.example", DNSResourceType::A);
        query.header.opcode = 2;
        let response = responder.respond(&query).await;
        assert_eq!(response.rcode(), Some(ResponseCode::NotImplemented));
    }
}
