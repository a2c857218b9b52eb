//! MLLP listener tests over a loopback socket

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::watch;
use triage::adapters::identity::{IdentityResult, IdentityService};
use triage::adapters::mllp::{encode_frame, FrameDecoder, MllpListener};
use triage::adapters::sink::LogSink;
use triage::config::{default_tenants, ListenerConfig, PipelineConfig};
use triage::core::patient_id::PatientIdResolver;
use triage::core::pipeline::{Pipeline, PipelineServices};
use triage::core::records::RecordAggregator;
use triage::core::tenant::{TenantDirectory, TenantResolver};
use triage::domain::{Mrn, PatientIdentifierSet, Resource};
use triage::hl7::{navigator, FieldPath, Message};

struct NoPatients;

#[async_trait]
impl IdentityService for NoPatients {
    async fn lookup_identifiers_by_mrn(&self, _mrn: &Mrn) -> IdentityResult<PatientIdentifierSet> {
        Ok(PatientIdentifierSet::default())
    }

    async fn search_paged(&self, _initial_path: &str) -> IdentityResult<Vec<Resource>> {
        Ok(Vec::new())
    }
}

fn services() -> PipelineServices {
    let identity = Arc::new(NoPatients);
    PipelineServices {
        tenants: TenantResolver::new(Arc::new(TenantDirectory::from_config(&default_tenants()))),
        patients: PatientIdResolver::new(identity.clone()),
        records: RecordAggregator::new(identity, "api/FHIR/STU3/Encounter", 7),
        sink: Arc::new(LogSink),
    }
}

async fn read_ack(stream: &mut TcpStream) -> Message {
    let mut decoder = FrameDecoder::new(64 * 1024);
    let mut buf = [0u8; 1024];
    loop {
        if let Some(frame) = decoder.next_frame().unwrap() {
            return Message::parse(std::str::from_utf8(&frame).unwrap()).unwrap();
        }
        let n = tokio::time::timeout(Duration::from_secs(5), stream.read(&mut buf))
            .await
            .expect("timed out waiting for ack")
            .unwrap();
        assert!(n > 0, "connection closed before ack");
        decoder.extend(&buf[..n]);
    }
}

fn msa(ack: &Message, field: usize) -> Option<String> {
    navigator::get(ack, &FieldPath::new("MSA", field)).unwrap()
}

#[tokio::test]
async fn test_listener_acknowledges_each_frame() {
    let listener = MllpListener::bind(&ListenerConfig {
        bind_address: "127.0.0.1:0".to_string(),
        max_frame_bytes: 64 * 1024,
    })
    .await
    .unwrap();
    let addr = listener.local_addr().unwrap();

    let (pipeline, router) = Pipeline::start(services(), &PipelineConfig::default());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let server = tokio::spawn(listener.serve(router, shutdown_rx));

    let mut stream = TcpStream::connect(addr).await.unwrap();

    // Accepted, routed to a tenant
    stream
        .write_all(&encode_frame(
            "MSH|^~\\&|EPIC|MDA|TRIAGE|HUB|20210708||ADT^A01|CTRL1|P|2.6\rPID|1||123^^^MDA^MR",
        ))
        .await
        .unwrap();
    let ack = read_ack(&mut stream).await;
    assert_eq!(msa(&ack, 1).as_deref(), Some("AA"));
    assert_eq!(msa(&ack, 2).as_deref(), Some("CTRL1"));
    assert_eq!(
        navigator::get(&ack, &FieldPath::new("MSH", 4)).unwrap().as_deref(),
        Some("HUB")
    );

    // Unknown tenant is still accepted
    stream
        .write_all(&encode_frame("MSH|^~\\&|EPIC|XYZ|||||ADT^A01|CTRL2|P|2.6"))
        .await
        .unwrap();
    let ack = read_ack(&mut stream).await;
    assert_eq!(msa(&ack, 1).as_deref(), Some("AA"));
    assert_eq!(msa(&ack, 2).as_deref(), Some("CTRL2"));

    // Not HL7 at all
    stream.write_all(&encode_frame("hello")).await.unwrap();
    let ack = read_ack(&mut stream).await;
    assert_eq!(msa(&ack, 1).as_deref(), Some("AR"));

    drop(stream);
    shutdown_tx.send(true).unwrap();
    server.await.unwrap().unwrap();

    let summary = pipeline.shutdown().await;
    assert_eq!(summary.received, 2);
    assert_eq!(summary.halted_no_tenant, 1);
    assert_eq!(summary.halted_no_identity, 1);
}

#[tokio::test]
async fn test_oversized_frame_closes_connection() {
    let listener = MllpListener::bind(&ListenerConfig {
        bind_address: "127.0.0.1:0".to_string(),
        max_frame_bytes: 16,
    })
    .await
    .unwrap();
    let addr = listener.local_addr().unwrap();

    let (pipeline, router) = Pipeline::start(services(), &PipelineConfig::default());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let server = tokio::spawn(listener.serve(router, shutdown_rx));

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(&encode_frame("MSH|^~\\&|EPIC|MDA|||||ADT^A01|CTRL1|P|2.6"))
        .await
        .unwrap();

    let mut buf = [0u8; 64];
    let n = tokio::time::timeout(Duration::from_secs(5), stream.read(&mut buf))
        .await
        .expect("timed out waiting for close")
        .unwrap_or(0);
    assert_eq!(n, 0);

    shutdown_tx.send(true).unwrap();
    server.await.unwrap().unwrap();
    assert_eq!(pipeline.shutdown().await.received, 0);
}
