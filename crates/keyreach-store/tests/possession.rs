//! Possession semantics across sessions, anchors and permission masks

#![allow(clippy::unwrap_used, clippy::expect_used, missing_docs)]

use keyreach_core::{
    Capability, CapabilitySet, Identity, KeySerial, KeyType, MutationPolicy, PermissionMask,
    StoreConfig,
};
use keyreach_store::{Anchor, NewCredential, SearchPath};
use keyreach_testkit::*;

#[test]
fn possession_is_required_even_for_the_owner() {
    init_test_tracing();
    let fixture = SessionFixture::new();
    let key = fixture.add_user_key("k1", "secret");

    // owner, but the user root is not reachable from the session root
    assert_eq!(fixture.session.describe(key).unwrap().owner, TEST_IDENTITY);
    assert_denied(&fixture.session.read(key));

    // reachable from the user root itself, so readable when anchored there
    let via_user = fixture
        .store
        .read(TEST_IDENTITY, fixture.user_root(), key);
    assert_payload(&via_user, b"secret");
}

#[test]
fn link_grants_possession_retroactively() {
    init_test_tracing();
    let fixture = SessionFixture::new();
    let key = fixture.add_user_key("k1", "data");
    let before = fixture.session.describe(key).unwrap();

    assert_denied(&fixture.session.read(key));
    fixture.link_user_into_session();
    assert_payload(&fixture.session.read(key), b"data");

    // the credential itself is untouched
    assert_eq!(fixture.session.describe(key).unwrap(), before);
}

#[test]
fn end_to_end_add_read_link_read() {
    init_test_tracing();
    let fixture = SessionFixture::new();
    let session = &fixture.session;

    let k1 = session
        .add(NewCredential::user("k1", "data"), session.user_root())
        .unwrap();
    assert_denied(&session.read(k1));
    session
        .link(session.user_root(), session.session_root())
        .unwrap();
    assert_payload(&session.read(k1), b"data");
    assert_eq!(session.locate("k1", None).unwrap(), k1);
}

#[test]
fn linking_twice_changes_nothing() {
    let fixture = SessionFixture::new();
    let key = fixture.add_user_key("k1", "data");

    fixture.link_user_into_session();
    let members = fixture.session.list(fixture.session_root()).unwrap();
    let perms = fixture.session.permissions(key).unwrap();

    fixture.link_user_into_session();
    assert_eq!(fixture.session.list(fixture.session_root()).unwrap(), members);
    assert_eq!(fixture.session.permissions(key).unwrap(), perms);
    assert_eq!(members, vec![fixture.user_root()]);
}

#[test]
fn locate_requires_reachability_not_existence() {
    let fixture = SessionFixture::new();
    let orphan_ring = fixture.session.add_keyring("orphan", None).unwrap();
    let hidden = fixture
        .session
        .add(NewCredential::user("hidden", "x"), orphan_ring)
        .unwrap();

    assert_denied(&fixture.session.read(hidden));
    assert_not_found(&fixture.session.locate("hidden", None));
    assert_not_found(&fixture.session.locate("never-created", None));
    assert_not_found(&fixture.session.read(KeySerial(9_999)));
}

#[test]
fn session_root_match_wins_over_user_root_match() {
    let fixture = SessionFixture::new();
    let in_user = fixture.add_user_key("dup", "user");
    let in_session = fixture.add_session_key("dup", "session");

    assert_eq!(fixture.session.locate("dup", None).unwrap(), in_session);
    assert_eq!(
        fixture
            .session
            .locate("dup", Some(fixture.user_root()))
            .unwrap(),
        in_user
    );

    // also holds once the user root is linked below the session root
    fixture.link_user_into_session();
    assert_eq!(fixture.session.locate("dup", None).unwrap(), in_session);
}

#[test]
fn user_root_is_searched_when_session_root_has_no_match() {
    let fixture = SessionFixture::new();
    let key = fixture.add_user_key("only-user", "v");

    assert_eq!(fixture.session.locate("only-user", None).unwrap(), key);
    // found, yet still not possessed from the session root
    assert_denied(&fixture.session.read(key));
}

#[test]
fn cycles_terminate() {
    let fixture = SessionFixture::new();
    let session = &fixture.session;
    let a = session.add_keyring("a", None).unwrap();
    let b = session.add_keyring("b", Some(a)).unwrap();
    session.link(a, b).unwrap();
    session.link(b, b).unwrap();
    let key = session.add(NewCredential::user("deep", "v"), b).unwrap();

    assert_not_found(&session.locate("missing", Some(a)));
    assert_eq!(session.locate("deep", Some(a)).unwrap(), key);
    assert!(!session.possesses(key).unwrap());

    session.link(a, session.session_root()).unwrap();
    assert!(session.possesses(key).unwrap());
    assert_payload(&session.read(key), b"v");
}

#[test]
fn owner_describes_but_cannot_read_unreachable() {
    let fixture = SessionFixture::new();
    let key = fixture.add_user_key("k1", "data");

    let desc = fixture.session.describe(key).unwrap();
    assert_eq!(desc.key_type, KeyType::User);
    assert_eq!(desc.to_string(), "user;1000;3f010000;k1");
    assert_denied(&fixture.session.read(key));

    let stranger = fixture.open_session(Identity(2000));
    assert_denied(&stranger.describe(key));
}

#[test]
fn logon_payloads_are_never_readable() {
    let fixture = SessionFixture::new();
    let key = fixture.add_to(Anchor::Session, NewCredential::logon("svc", "pw"));

    assert!(fixture.session.possesses(key).unwrap());
    assert!(fixture
        .session
        .permissions(key)
        .unwrap()
        .contains(Capability::Read));
    assert_denied(&fixture.session.read(key));
    assert_eq!(fixture.session.locate("svc", None).unwrap(), key);
}

#[test]
fn set_perm_requires_setattr_and_can_revoke_read() {
    let fixture = SessionFixture::new();
    let key = fixture.add_session_key("k1", "data");

    let mut possessor = CapabilitySet::all();
    possessor.remove(Capability::Read);
    possessor.remove(Capability::SetAttr);
    let mask = PermissionMask::default().with_possessor(possessor);

    fixture.session.set_perm(key, mask).unwrap();
    assert_denied(&fixture.session.read(key));

    // setattr is gone too, so the change cannot be undone
    assert_denied(&fixture.session.set_perm(key, PermissionMask::default()));
    assert_eq!(fixture.session.describe(key).unwrap().mask, mask);
}

#[test]
fn strict_policy_denies_add_without_write() {
    let config = StoreConfig {
        mutation_policy: MutationPolicy::RequireWrite,
        ..StoreConfig::default()
    };
    let fixture = SessionFixture::with_config(config);

    // user root is owned but not possessed; owner class only has view
    let result = fixture
        .session
        .add(NewCredential::user("k", "v"), fixture.user_root());
    assert_denied(&result);

    // the policy also stops the session from linking its own user root
    assert_denied(&fixture.session.link_anchor(Anchor::User, Anchor::Session));

    // the store-level link is unchecked
    fixture
        .store
        .link(fixture.user_root(), fixture.session_root())
        .unwrap();
    assert!(fixture
        .session
        .add(NewCredential::user("k", "v"), fixture.user_root())
        .is_ok());
}

#[test]
fn strict_policy_denies_keyring_planted_without_write() {
    let config = StoreConfig {
        mutation_policy: MutationPolicy::RequireWrite,
        ..StoreConfig::default()
    };
    let fixture = SessionFixture::with_config(config);
    let stranger = fixture.open_session(Identity(2000));

    assert_denied(&stranger.add(NewCredential::user("k", "v"), fixture.session_root()));
    assert_denied(&stranger.add_keyring("planted", Some(fixture.session_root())));
    assert!(fixture.session.list(fixture.session_root()).unwrap().is_empty());

    // a keyring of its own, or one nested in its own session root, is fine
    let loose = stranger.add_keyring("loose", None).unwrap();
    let nested = stranger
        .add_keyring("nested", Some(stranger.session_root()))
        .unwrap();
    assert_eq!(stranger.list(stranger.session_root()).unwrap(), vec![nested]);
    assert!(!stranger.possesses(loose).unwrap());
}

#[test]
fn sessions_of_one_identity_share_the_user_root() {
    let fixture = SessionFixture::new();
    let key = fixture.add_user_key("shared", "v");
    let second = fixture.open_session(TEST_IDENTITY);

    assert_eq!(second.user_root(), fixture.user_root());
    assert_ne!(second.session_root(), fixture.session_root());
    assert_eq!(second.locate("shared", None).unwrap(), key);

    // linking in one session does not give the other possession
    fixture.link_user_into_session();
    assert_payload(&fixture.session.read(key), b"v");
    assert_denied(&second.read(key));
}

#[test]
fn possession_is_not_ownership() {
    let fixture = SessionFixture::new();
    let key = fixture.add_session_key("k1", "data");
    let stranger = fixture.open_session(Identity(2000));

    assert_denied(&stranger.read(key));
    stranger
        .link(fixture.session_root(), stranger.session_root())
        .unwrap();
    assert_payload(&stranger.read(key), b"data");
    assert_eq!(
        fixture
            .store
            .locate(stranger.identity(), "k1", &stranger.search_path())
            .unwrap(),
        key
    );
}

#[test]
fn invalid_targets_are_reported() {
    let fixture = SessionFixture::new();
    let key = fixture.add_session_key("k1", "data");

    assert_invalid_target(&fixture.session.add(NewCredential::user("x", "y"), key));
    assert_invalid_target(&fixture.session.add(NewCredential::user("x", "y"), KeySerial(777)));
    assert_invalid_target(&fixture.session.link(fixture.user_root(), key));
    assert_invalid_target(&fixture.session.read(fixture.user_root()));
    assert_invalid_target(&fixture.session.list(key));
    assert_invalid_target(
        &fixture
            .store
            .locate(TEST_IDENTITY, "k1", &SearchPath::anchored(key)),
    );
}

#[test]
fn user_credentials_round_trip() {
    let fixture = SessionFixture::new();
    let cred = keyreach_store::UserPass::new("admin", "pa:ss").unwrap();
    let serial = fixture
        .session
        .write_user_cred("router", &cred, fixture.user_root())
        .unwrap();

    assert_denied(&fixture.session.read_user_cred(serial));
    fixture.link_user_into_session();
    let back = fixture.session.read_user_cred(serial).unwrap();
    assert_eq!(back.username(), "admin");
    assert_eq!(back.password(), "pa:ss");
    assert_eq!(fixture.session.read_string(serial).unwrap(), "admin:pa:ss");
    assert_eq!(fixture.session.read_user_cred_named("router").unwrap(), back);
}
