use super::*;
use crate::{
    auth::{MaintainerCredentials, PrincipalPolicy},
    error::{ErrorClass, LookupError, MalformedUpdateError},
    model::ObjectType,
    obs::{MetricsEvent, MetricsSink, with_metrics_sink},
    store::{MemoryStore, RecordLookup, fault},
    test_support::{mntner, record, seeded_store, stored},
    update::Credential,
};
use std::{cell::RefCell, rc::Rc, thread};

const OWNER_PASSWORD: &str = "owner";

///
/// CaptureSink
///

#[derive(Default)]
struct CaptureSink(RefCell<Vec<MetricsEvent>>);

impl CaptureSink {
    fn count(&self, wanted: MetricsEvent) -> usize {
        self.0.borrow().iter().filter(|event| **event == wanted).count()
    }
}

impl MetricsSink for CaptureSink {
    fn record(&self, event: MetricsEvent) {
        self.0.borrow_mut().push(event);
    }
}

fn registry() -> Arc<MemoryStore> {
    seeded_store([
        mntner("OWNER-MNT", OWNER_PASSWORD),
        record("aut-num: AS12726\nmnt-routes: OWNER-MNT\nmnt-by: OWNER-MNT\n"),
    ])
}

fn pipeline(store: &Arc<MemoryStore>) -> UpdatePipeline {
    let indexes = Arc::new(IndexRegistry::with_defaults());
    let authenticator = Authenticator::with_defaults(
        store.clone(),
        Arc::new(MaintainerCredentials),
        PrincipalPolicy::default(),
    );
    let validators = ValidatorRegistry::with_defaults(store.clone(), indexes.clone());

    UpdatePipeline::new(store.clone(), indexes, authenticator, validators)
        .with_retry_policy(RetryPolicy::new(3, Duration::ZERO))
}

fn owner() -> Vec<Credential> {
    vec![Credential::Password(OWNER_PASSWORD.to_string())]
}

fn person(nic_hdl: &str) -> Record {
    record(&format!("person: Jo\nnic-hdl: {nic_hdl}\nmnt-by: OWNER-MNT\n"))
}

fn process_captured(pipeline: &UpdatePipeline, request: UpdateRequest) -> (UpdateContext, Rc<CaptureSink>) {
    let sink = Rc::new(CaptureSink::default());
    let ctx = with_metrics_sink(sink.clone(), || pipeline.process(request));

    (ctx, sink)
}

fn storage_kind(ctx: &UpdateContext) -> Option<StorageErrorKind> {
    match ctx.error() {
        Some(UpdateError::TransientStorage(err) | UpdateError::FatalStorage(err)) => Some(err.kind),
        _ => None,
    }
}

//
// success path
//

#[test]
fn create_persists_and_indexes_in_one_step() {
    let store = registry();
    let pipeline = pipeline(&store);

    let (ctx, sink) = process_captured(
        &pipeline,
        UpdateRequest::create(person("JO1-TEST")).with_credentials(owner()),
    );

    assert!(ctx.is_success(), "unexpected failure: {:?}", ctx.error());
    assert_eq!(ctx.state(), UpdateState::Indexed);
    let handle = ctx.handle().expect("success carries a handle").clone();
    assert_eq!(handle.object_type(), ObjectType::Person);

    let saved = stored(&store, ObjectType::Person, "jo1-test");
    assert_eq!(saved.value(AttributeType::Source), Some(CiString::new("TEST")));
    assert!(
        store
            .find_in_index(pipeline.indexes(), AttributeType::MntBy, &CiString::new("owner-mnt"))
            .expect("mnt-by is indexed")
            .contains(&handle)
    );
    assert_eq!(
        sink.count(MetricsEvent::UpdateFinish {
            state: UpdateState::Indexed
        }),
        1
    );
    assert!(
        ctx.messages()
            .last()
            .is_some_and(|entry| entry.message.text() == "CREATE SUCCEEDED: [person] JO1-TEST")
    );
}

#[test]
fn configured_source_is_stamped_only_when_missing() {
    let store = registry();
    let pipeline = pipeline(&store).with_source("RIPE");

    pipeline.process(UpdateRequest::create(person("JO1-TEST")).with_credentials(owner()));
    pipeline.process(
        UpdateRequest::create(record(
            "person: Al\nnic-hdl: AL1-TEST\nmnt-by: OWNER-MNT\nsource: OTHER\n",
        ))
        .with_credentials(owner()),
    );

    assert_eq!(
        stored(&store, ObjectType::Person, "JO1-TEST").value(AttributeType::Source),
        Some(CiString::new("RIPE"))
    );
    assert_eq!(
        stored(&store, ObjectType::Person, "AL1-TEST").value(AttributeType::Source),
        Some(CiString::new("OTHER"))
    );
}

#[test]
fn modify_replaces_rows_and_keeps_the_object_id() {
    let store = registry();
    let pipeline = pipeline(&store);
    pipeline.process(UpdateRequest::create(person("JO1-TEST")).with_credentials(owner()));
    let reference = stored(&store, ObjectType::Person, "JO1-TEST");

    let submitted = record("person: Jo\nnic-hdl: JO1-TEST\nmnt-by: OWNER-MNT\nremarks: moved\n");
    let (ctx, sink) = process_captured(
        &pipeline,
        UpdateRequest::modify(reference.clone(), submitted).with_credentials(owner()),
    );

    assert!(ctx.is_success(), "unexpected failure: {:?}", ctx.error());
    let current = stored(&store, ObjectType::Person, "JO1-TEST");
    assert_eq!(current.object_id(), reference.object_id());
    assert_eq!(current.value(AttributeType::Remarks), Some(CiString::new("moved")));
    assert_eq!(
        sink.count(MetricsEvent::IndexDelta {
            inserts: 0,
            removes: 0
        }),
        1,
        "no indexed attribute changed"
    );
}

#[test]
fn delete_removes_record_and_rows() {
    let store = registry();
    let pipeline = pipeline(&store);
    pipeline.process(UpdateRequest::create(person("JO1-TEST")).with_credentials(owner()));
    let reference = stored(&store, ObjectType::Person, "JO1-TEST");

    let ctx = pipeline.process(UpdateRequest::delete(reference).with_credentials(owner()));

    assert!(ctx.is_success(), "unexpected failure: {:?}", ctx.error());
    assert!(
        store
            .get_by_key(ObjectType::Person, &CiString::new("JO1-TEST"))
            .is_err_and(|err| err.is_not_found())
    );
    assert!(store.index_rows(AttributeType::NicHdl).is_empty());
    let owners = store
        .find_in_index(pipeline.indexes(), AttributeType::MntBy, &CiString::new("OWNER-MNT"))
        .expect("mnt-by is indexed");
    assert!(owners.iter().all(|handle| handle.object_type() != ObjectType::Person));
}

#[test]
fn route_create_is_found_through_its_origin() {
    let store = registry();
    let pipeline = pipeline(&store);

    let ctx = pipeline.process(
        UpdateRequest::create(record("route: 180.0/8\norigin: AS12726\nmnt-by: OWNER-MNT\n"))
            .with_credentials(owner()),
    );

    assert!(ctx.is_success(), "unexpected failure: {:?}", ctx.error());
    let found = store
        .find_in_index(pipeline.indexes(), AttributeType::Origin, &CiString::new("as12726"))
        .expect("origin is indexed");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].key(), &CiString::new("180.0/8AS12726"));
}

//
// failures before persistence
//

#[test]
fn malformed_input_fails_fast() {
    let store = registry();
    let pipeline = pipeline(&store);

    let ctx = pipeline.process(UpdateRequest::default());

    assert_eq!(ctx.state(), UpdateState::Failed);
    assert_eq!(
        ctx.error(),
        Some(&UpdateError::Malformed(MalformedUpdateError::BothAbsent))
    );
    assert_eq!(ctx.errors().count(), 1);
}

#[test]
fn unauthenticated_update_leaves_storage_untouched() {
    let store = registry();
    let pipeline = pipeline(&store);
    let before = store.len();

    let (ctx, sink) = process_captured(
        &pipeline,
        UpdateRequest::create(person("JO1-TEST"))
            .with_credentials(vec![Credential::Password("guess".to_string())]),
    );

    assert!(matches!(ctx.error(), Some(UpdateError::AuthenticationFailed(_))));
    assert_eq!(sink.count(MetricsEvent::AuthenticationFailed), 1);
    assert_eq!(store.len(), before);
    assert!(ctx.errors().next().is_some_and(|entry| entry.message.text().contains("OWNER-MNT")));
}

#[test]
fn blocking_validation_stops_before_storage() {
    let store = registry();
    let pipeline = pipeline(&store);
    pipeline.process(UpdateRequest::create(person("JO1-TEST")).with_credentials(owner()));
    let reference = stored(&store, ObjectType::Mntner, "OWNER-MNT");

    let (ctx, sink) = process_captured(
        &pipeline,
        UpdateRequest::delete(reference).with_credentials(owner()),
    );

    assert!(matches!(ctx.error(), Some(UpdateError::ValidationFailed { .. })));
    assert_eq!(sink.count(MetricsEvent::ValidationBlocked), 1);
    assert!(
        store
            .get_by_key(ObjectType::Mntner, &CiString::new("OWNER-MNT"))
            .is_ok()
    );
}

//
// persistence
//

#[test]
fn transient_commit_failures_are_retried() {
    let store = registry();
    let pipeline = pipeline(&store);
    fault::fail_next_commits(StorageErrorKind::ConnectionLost, 2);

    let (ctx, sink) = process_captured(
        &pipeline,
        UpdateRequest::create(person("JO1-TEST")).with_credentials(owner()),
    );
    fault::clear();

    assert!(ctx.is_success(), "unexpected failure: {:?}", ctx.error());
    assert_eq!(sink.count(MetricsEvent::RetryAttempt), 2);
    assert_eq!(store.index_rows(AttributeType::NicHdl).len(), 1);
}

#[test]
fn exhausted_retries_persist_nothing() {
    let store = registry();
    let pipeline = pipeline(&store);
    fault::fail_next_commits(StorageErrorKind::Transient, 3);

    let (ctx, sink) = process_captured(
        &pipeline,
        UpdateRequest::create(person("JO1-TEST")).with_credentials(owner()),
    );
    fault::clear();

    assert_eq!(storage_kind(&ctx), Some(StorageErrorKind::Transient));
    assert!(matches!(ctx.error(), Some(UpdateError::TransientStorage(_))));
    assert_eq!(sink.count(MetricsEvent::RetryAttempt), 2);
    assert!(matches!(
        store.get_by_key(ObjectType::Person, &CiString::new("JO1-TEST")),
        Err(LookupError::NotFound { .. })
    ));
    assert!(store.index_rows(AttributeType::NicHdl).is_empty());
    assert!(
        !pipeline
            .locks()
            .is_locked(ObjectType::Person, &CiString::new("JO1-TEST")),
        "record lock is released after every attempt"
    );
}

#[test]
fn fatal_commit_failures_are_not_retried() {
    let store = registry();
    let pipeline = pipeline(&store);
    fault::fail_next_commits(StorageErrorKind::Fatal, 1);

    let (ctx, sink) = process_captured(
        &pipeline,
        UpdateRequest::create(person("JO1-TEST")).with_credentials(owner()),
    );
    fault::clear();

    assert_eq!(storage_kind(&ctx), Some(StorageErrorKind::Fatal));
    assert_eq!(sink.count(MetricsEvent::RetryAttempt), 0);
    assert!(store.index_rows(AttributeType::NicHdl).is_empty());
}

#[test]
fn stale_reference_is_a_conflict() {
    let store = registry();
    let pipeline = pipeline(&store);
    pipeline.process(UpdateRequest::create(person("JO1-TEST")).with_credentials(owner()));
    let stale = stored(&store, ObjectType::Person, "JO1-TEST");

    let first = pipeline.process(
        UpdateRequest::modify(
            stale.clone(),
            record("person: Jo\nnic-hdl: JO1-TEST\nmnt-by: OWNER-MNT\nremarks: first\n"),
        )
        .with_credentials(owner()),
    );
    let second = pipeline.process(
        UpdateRequest::modify(
            stale,
            record("person: Jo\nnic-hdl: JO1-TEST\nmnt-by: OWNER-MNT\nremarks: second\n"),
        )
        .with_credentials(owner()),
    );

    assert!(first.is_success());
    assert_eq!(storage_kind(&second), Some(StorageErrorKind::Conflict));
    assert_eq!(
        stored(&store, ObjectType::Person, "JO1-TEST").value(AttributeType::Remarks),
        Some(CiString::new("first"))
    );
}

#[test]
fn duplicate_create_is_a_conflict() {
    let store = registry();
    let pipeline = pipeline(&store);

    let first = pipeline.process(UpdateRequest::create(person("JO1-TEST")).with_credentials(owner()));
    let second = pipeline.process(UpdateRequest::create(person("jo1-test")).with_credentials(owner()));

    assert!(first.is_success());
    assert_eq!(storage_kind(&second), Some(StorageErrorKind::Conflict));
    assert_eq!(store.index_rows(AttributeType::NicHdl).len(), 1);
}

#[test]
fn role_reusing_a_person_nic_hdl_is_a_conflict() {
    let store = registry();
    let pipeline = pipeline(&store);

    let person = pipeline.process(UpdateRequest::create(person("JO1-TEST")).with_credentials(owner()));
    let role = pipeline.process(
        UpdateRequest::create(record("role: Ops\nnic-hdl: jo1-test\nmnt-by: OWNER-MNT\n"))
            .with_credentials(owner()),
    );

    assert!(person.is_success());
    assert_eq!(storage_kind(&role), Some(StorageErrorKind::Conflict));
    assert_eq!(role.error().map(UpdateError::class), Some(ErrorClass::Storage));
    assert_eq!(store.index_rows(AttributeType::NicHdl).len(), 1);
    assert!(matches!(
        store.get_by_key(ObjectType::Role, &CiString::new("JO1-TEST")),
        Err(LookupError::NotFound { .. })
    ));
}

#[test]
fn disjoint_updates_run_concurrently() {
    let store = registry();
    let pipeline = pipeline(&store);
    let before = store.len();

    thread::scope(|scope| {
        for n in 0..8 {
            let pipeline = &pipeline;
            scope.spawn(move || {
                let ctx = pipeline.process(
                    UpdateRequest::create(person(&format!("P{n}-TEST"))).with_credentials(owner()),
                );
                assert!(ctx.is_success(), "worker {n}: {:?}", ctx.error());
            });
        }
    });

    assert_eq!(store.len(), before + 8);
    assert_eq!(store.index_rows(AttributeType::NicHdl).len(), 8);
}
