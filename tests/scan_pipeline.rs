//! End-to-end scans against stub providers.

mod helpers;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use domain_intel::initialization::init_client;
use domain_intel::{
    fetch_metadata, AnalysisContext, AnalysisOptions, Credentials, ProviderEndpoints, RiskLevel,
};
use domain_intel::gateway::{MirrorFetcher, ProviderGateway};

use helpers::{spawn_stub, StubResponse};

const CLEAN_REPUTATION: &str = r#"{
    "data": {"attributes": {
        "reputation": 120,
        "last_analysis_stats": {"malicious": 0, "suspicious": 0, "harmless": 70, "undetected": 20},
        "last_dns_records": [
            {"type": "NS", "value": "a.iana-servers.net"},
            {"type": "A", "value": "93.184.216.34"}
        ],
        "creation_date": 808371213,
        "last_modification_date": 1755028800,
        "registrar": "RESERVED-IANA",
        "tags": []
    }}
}"#;

const WHOIS_BODY: &str =
    r#"{"created":"1995-08-14","expires":"2026-08-13","registrar":"IANA"}"#;

const PAGE_BODY: &str = r#"<html lang="en"><head>
<title>Example Domain</title>
<meta name="description" content="Illustrative example page.">
</head><body></body></html>"#;

fn context_over(base: String, mirrors: Vec<String>) -> AnalysisContext {
    let client = init_client(Duration::from_secs(2)).expect("client");
    let endpoints = ProviderEndpoints {
        whois_base: base.clone(),
        reputation_base: base.clone(),
        fraud_base: base.clone(),
        abuse_base: base.clone(),
        dnsbl_base: base,
    };
    let credentials = Credentials {
        ipqs_keys: vec!["k1".to_string()],
        abuseipdb_key: Some("abuse-key".to_string()),
    };
    let options = AnalysisOptions {
        request_timeout: Duration::from_secs(2),
        metadata_mirrors: mirrors,
        metadata_attempt_timeout: Duration::from_millis(500),
    };
    AnalysisContext::new(client, endpoints, credentials, options)
}

#[tokio::test]
async fn clean_domain_yields_clean_records_with_whois_overrides() {
    let stub = spawn_stub(|path| {
        if path.starts_with("/whois") {
            StubResponse::ok(WHOIS_BODY)
        } else if path.contains("/reputation/domains/example.com") {
            StubResponse::ok(CLEAN_REPUTATION)
        } else if path.contains("/fraud/ip/") {
            StubResponse::ok(r#"{"success":true,"fraud_score":0,"vpn":false}"#)
        } else if path.contains("/abuse/check") {
            StubResponse::ok(r#"{"data":{"abuseConfidenceScore":0,"totalReports":0}}"#)
        } else if path.contains("/dnsbl/check") {
            StubResponse::ok(r#"{"ip":"93.184.216.34","listedCount":0,"results":[]}"#)
        } else {
            StubResponse::ok(PAGE_BODY)
        }
    })
    .await;

    let mirrors = vec![format!("{}/page?url={{target}}", stub.url())];
    let context = context_over(stub.url(), mirrors);

    let outcome = domain_intel::analyze_domain(&context, "example.com")
        .await
        .expect("scan");
    let (scan, reputation) = outcome.records.expect("records");

    assert_eq!(reputation.risk_level, RiskLevel::Clean);
    assert_eq!(reputation.malicious, 0);
    assert_eq!(scan.abuse_score, 0);
    assert_eq!(scan.ip_address, "93.184.216.34");
    assert!(!scan.is_anonymized);
    // WHOIS answered, so its fields override the reputation-provider seed
    assert_eq!(scan.created, "1995-08-14");
    assert_eq!(scan.expires, "2026-08-13");
    assert_eq!(scan.registrar, "IANA");
    assert_eq!(scan.name_servers, vec!["a.iana-servers.net".to_string()]);
    assert!(scan.dns_records.contains("A: 93.184.216.34"));
    assert!(scan.domain_age().contains("year"));

    let metadata = outcome.metadata.await_result().await;
    assert!(metadata.error.is_none());
    assert_eq!(metadata.title.as_deref(), Some("Example Domain"));
    assert_eq!(metadata.lang.as_deref(), Some("en"));
}

#[tokio::test]
async fn whois_failure_keeps_reputation_seeded_dates() {
    let stub = spawn_stub(|path| {
        if path.starts_with("/whois") {
            StubResponse::status(500, r#"{"error":"whois backend down"}"#)
        } else if path.contains("/reputation/domains/") {
            StubResponse::ok(CLEAN_REPUTATION)
        } else if path.contains("/fraud/ip/") {
            StubResponse::ok(r#"{"success":true,"fraud_score":0}"#)
        } else if path.contains("/abuse/check") {
            StubResponse::ok(r#"{"data":{"abuseConfidenceScore":0}}"#)
        } else if path.contains("/dnsbl/check") {
            StubResponse::ok(r#"{"listedCount":0,"results":[]}"#)
        } else {
            StubResponse::ok(PAGE_BODY)
        }
    })
    .await;

    let mirrors = vec![format!("{}/page?url={{target}}", stub.url())];
    let context = context_over(stub.url(), mirrors);

    let outcome = domain_intel::analyze_domain(&context, "seeded.example")
        .await
        .expect("scan");
    let (scan, _) = outcome.records.expect("records");

    // no WHOIS answer, so the reputation-derived fields survive
    assert_eq!(scan.created, "1995-08-14 03:33:33 UTC");
    assert_eq!(scan.expires, "2025-08-12 20:00:00 UTC");
    assert_eq!(scan.registrar, "RESERVED-IANA");
    let _ = outcome.metadata.await_result().await;
}

#[tokio::test]
async fn fraudulent_ip_raises_abuse_score_and_flags_anonymization() {
    let stub = spawn_stub(|path| {
        if path.starts_with("/whois") {
            StubResponse::ok(WHOIS_BODY)
        } else if path.contains("/reputation/domains/") {
            StubResponse::ok(CLEAN_REPUTATION)
        } else if path.contains("/fraud/ip/") {
            StubResponse::ok(r#"{"success":true,"fraud_score":82,"vpn":true,"proxy":false,"tor":false,"ISP":"Shady Hosting"}"#)
        } else if path.contains("/abuse/check") {
            StubResponse::ok(r#"{"data":{"abuseConfidenceScore":40,"totalReports":3}}"#)
        } else if path.contains("/dnsbl/check") {
            StubResponse::ok(r#"{"listedCount":0,"results":[]}"#)
        } else {
            StubResponse::ok(PAGE_BODY)
        }
    })
    .await;

    let mirrors = vec![format!("{}/page?url={{target}}", stub.url())];
    let context = context_over(stub.url(), mirrors);

    let outcome = domain_intel::analyze_domain(&context, "sketchy.example")
        .await
        .expect("scan");
    let (scan, _) = outcome.records.expect("records");

    assert!(scan.abuse_score >= 82, "abuse score {}", scan.abuse_score);
    assert!(scan.is_anonymized);
    assert_eq!(scan.isp, "Shady Hosting");
    let _ = outcome.metadata.await_result().await;
}

#[tokio::test]
async fn same_ip_is_fetched_at_most_once_per_session() {
    let fraud_hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&fraud_hits);
    let stub = spawn_stub(move |path| {
        if path.starts_with("/whois") {
            StubResponse::ok(WHOIS_BODY)
        } else if path.contains("/reputation/domains/") {
            StubResponse::ok(CLEAN_REPUTATION)
        } else if path.contains("/fraud/ip/") {
            if !path.contains("/8.8.8.8") {
                counter.fetch_add(1, Ordering::SeqCst);
            }
            StubResponse::ok(r#"{"success":true,"fraud_score":0}"#)
        } else if path.contains("/abuse/check") {
            StubResponse::ok(r#"{"data":{"abuseConfidenceScore":0}}"#)
        } else if path.contains("/dnsbl/check") {
            StubResponse::ok(r#"{"listedCount":0,"results":[]}"#)
        } else {
            StubResponse::ok(PAGE_BODY)
        }
    })
    .await;

    let mirrors = vec![format!("{}/page?url={{target}}", stub.url())];
    let context = context_over(stub.url(), mirrors);

    // both domains resolve to the same A record
    let first = domain_intel::analyze_domain(&context, "one.example")
        .await
        .expect("first scan");
    let second = domain_intel::analyze_domain(&context, "two.example")
        .await
        .expect("second scan");
    let _ = first.metadata.await_result().await;
    let _ = second.metadata.await_result().await;

    assert_eq!(fraud_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn blacklist_estimate_applies_only_when_abuse_fails_and_score_is_zero() {
    let stub = spawn_stub(|path| {
        if path.starts_with("/whois") {
            StubResponse::ok(WHOIS_BODY)
        } else if path.contains("/reputation/domains/") {
            StubResponse::ok(CLEAN_REPUTATION)
        } else if path.contains("/fraud/ip/") {
            StubResponse::ok(r#"{"success":true,"fraud_score":0}"#)
        } else if path.contains("/abuse/check") {
            StubResponse::status(503, r#"{"error":"unavailable"}"#)
        } else if path.contains("/dnsbl/check") {
            StubResponse::ok(
                r#"{"listedCount":2,"results":[{"zone":"zen.spamhaus.org","listed":true},{"zone":"bl.spamcop.net","listed":true}]}"#,
            )
        } else {
            StubResponse::ok(PAGE_BODY)
        }
    })
    .await;

    let mirrors = vec![format!("{}/page?url={{target}}", stub.url())];
    let context = context_over(stub.url(), mirrors);

    let outcome = domain_intel::analyze_domain(&context, "listed.example")
        .await
        .expect("scan");
    let (scan, _) = outcome.records.expect("records");

    // two listings at 25 points each
    assert_eq!(scan.abuse_score, 50);
    let _ = outcome.metadata.await_result().await;
}

#[tokio::test]
async fn degraded_providers_still_produce_records() {
    let stub = spawn_stub(|path| {
        if path.starts_with("/page") {
            StubResponse::ok(PAGE_BODY)
        } else {
            StubResponse::status(500, r#"{"error":"down"}"#)
        }
    })
    .await;

    let mirrors = vec![format!("{}/page?url={{target}}", stub.url())];
    let context = context_over(stub.url(), mirrors);

    let outcome = domain_intel::analyze_domain(&context, "dark.example")
        .await
        .expect("scan");
    let (scan, reputation) = outcome.records.expect("records");

    assert_eq!(reputation.risk_level, RiskLevel::Clean);
    assert_eq!(scan.created, "-");
    assert_eq!(scan.registrar, "-");
    assert_eq!(scan.ip_address, "-");
    assert_eq!(scan.abuse_score, 0);

    let metadata = outcome.metadata.await_result().await;
    assert!(metadata.error.is_none());
}

#[tokio::test]
async fn empty_domain_is_rejected() {
    let stub = spawn_stub(|_| StubResponse::ok("{}")).await;
    let context = context_over(stub.url(), vec![]);

    let err = domain_intel::analyze_domain(&context, "   ")
        .await
        .err()
        .expect("error");
    assert_eq!(err.to_string(), "Missing required parameter: domain");
}

#[tokio::test]
async fn exhausted_mirrors_yield_an_error_only_metadata_record() {
    let slow = spawn_stub(|_| {
        StubResponse::delayed(PAGE_BODY, Duration::from_secs(5))
    })
    .await;

    let client = init_client(Duration::from_secs(2)).expect("client");
    let fetcher = MirrorFetcher::new(
        ProviderGateway::new(client, Duration::from_secs(2)),
        vec![
            format!("{}/a?url={{target}}", slow.url()),
            format!("{}/b?url={{target}}", slow.url()),
        ],
        Duration::from_millis(200),
    );

    let record = fetch_metadata(fetcher, "slow.example").await;
    assert_eq!(record.domain, "slow.example");
    let error = record.error.expect("error field");
    assert!(error.contains("timed out"), "got {error}");
    assert!(record.title.is_none());
    assert_eq!(record.completeness_score, 0);
}

#[tokio::test]
async fn mirror_http_failure_is_worded_differently_from_timeout() {
    let stub = spawn_stub(|_| StubResponse::status(502, "bad gateway")).await;

    let client = init_client(Duration::from_secs(2)).expect("client");
    let fetcher = MirrorFetcher::new(
        ProviderGateway::new(client, Duration::from_secs(2)),
        vec![format!("{}/a?url={{target}}", stub.url())],
        Duration::from_millis(500),
    );

    let record = fetch_metadata(fetcher, "down.example").await;
    let error = record.error.expect("error field");
    assert!(error.starts_with("Failed to fetch metadata"), "got {error}");
    assert!(!error.contains("timed out"));
}
