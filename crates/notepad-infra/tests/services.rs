//! Service-level tests against the in-memory store and real crypto.

#![cfg(feature = "auth")]

use std::sync::Arc;

use chrono::{TimeDelta, Utc};

use notepad_core::domain::{ChordChanges, NewChord, Role, User};
use notepad_core::ports::{BaseRepository, ChordFilter, TokenService, UserFilter};
use notepad_core::services::{AuthService, ChordService, ModerationService, Registration};
use notepad_core::{DomainError, PageRequest};
use notepad_infra::{
    Argon2PasswordService, InMemoryChordRepository, InMemoryUserRepository, JwtConfig,
    JwtTokenService,
};

struct Harness {
    users: Arc<InMemoryUserRepository>,
    tokens: Arc<JwtTokenService>,
    auth: AuthService,
    chords: ChordService,
    moderation: ModerationService,
}

fn harness() -> Harness {
    let users = Arc::new(InMemoryUserRepository::new());
    let chords = Arc::new(InMemoryChordRepository::new());
    let tokens = Arc::new(JwtTokenService::new(JwtConfig {
        secret: "integration-secret".to_string(),
        expiration_hours: 1,
        issuer: "notepad-tests".to_string(),
    }));

    Harness {
        auth: AuthService::new(
            users.clone(),
            Arc::new(Argon2PasswordService::new()),
            tokens.clone(),
        ),
        chords: ChordService::new(chords),
        moderation: ModerationService::new(users.clone()),
        users,
        tokens,
    }
}

fn registration(name: &str) -> Registration {
    Registration {
        username: name.to_string(),
        email: format!("{}@example.com", name),
        password: "correct-horse".to_string(),
    }
}

async fn admin(h: &Harness) -> User {
    h.auth.ensure_admin(registration("root")).await.unwrap()
}

fn new_chord(name: &str, fingering: &str) -> NewChord {
    NewChord {
        name: name.to_string(),
        fingering: fingering.to_string(),
        description: None,
    }
}

#[tokio::test]
async fn test_register_issues_valid_token() {
    let h = harness();
    let session = h.auth.register(registration("alice")).await.unwrap();

    assert_eq!(session.user.role, Role::User);
    assert_eq!(session.expires_in, 3600);

    let claims = h.tokens.validate_token(&session.token).unwrap();
    assert_eq!(claims.user_id, session.user.id);
    assert_eq!(claims.username, "alice");
    assert_eq!(claims.roles, vec!["user".to_string()]);
}

#[tokio::test]
async fn test_register_normalizes_email_and_rejects_duplicates() {
    let h = harness();
    let mut input = registration("alice");
    input.email = "  Alice@Example.COM ".to_string();
    let session = h.auth.register(input).await.unwrap();
    assert_eq!(session.user.email, "alice@example.com");

    let dup_email = h.auth.register(Registration {
        username: "alice2".into(),
        ..registration("alice")
    });
    assert!(matches!(dup_email.await, Err(DomainError::Duplicate(_))));

    let dup_name = h.auth.register(Registration {
        email: "other@example.com".into(),
        ..registration("alice")
    });
    assert!(matches!(dup_name.await, Err(DomainError::Duplicate(_))));
}

#[tokio::test]
async fn test_login_by_email_or_username() {
    let h = harness();
    h.auth.register(registration("bob")).await.unwrap();
    let now = Utc::now();

    assert!(h.auth.login("bob", "correct-horse", now).await.is_ok());
    assert!(h.auth.login("BOB@example.com", "correct-horse", now).await.is_ok());
    assert!(matches!(
        h.auth.login("bob", "wrong-horse", now).await,
        Err(DomainError::Unauthorized)
    ));
    assert!(matches!(
        h.auth.login("nobody", "correct-horse", now).await,
        Err(DomainError::Unauthorized)
    ));
}

#[tokio::test]
async fn test_block_prevents_login_until_expiry() {
    let h = harness();
    let root = admin(&h).await;
    let bob = h.auth.register(registration("bob")).await.unwrap().user;
    let now = Utc::now();
    let until = now + TimeDelta::hours(1);

    let blocked = h.moderation.block(&root, bob.id, until, now).await.unwrap();
    assert_eq!(blocked.blocked_until, Some(until));

    match h.auth.login("bob", "correct-horse", now).await {
        Err(DomainError::Blocked { until: reported }) => assert_eq!(reported, until),
        other => panic!("expected blocked login, got {:?}", other.map(|s| s.user.id)),
    }
    assert!(matches!(
        h.auth.current_user(bob.id, now).await,
        Err(DomainError::Blocked { .. })
    ));

    // Once the stamp lapses the account works again, even before the sweep.
    let later = until + TimeDelta::seconds(1);
    assert!(h.auth.login("bob", "correct-horse", later).await.is_ok());
    assert_eq!(h.moderation.sweep_expired_blocks(later).await.unwrap(), 1);
    let bob = h.users.find_by_id(bob.id).await.unwrap().unwrap();
    assert!(bob.blocked_until.is_none());
}

#[tokio::test]
async fn test_unblock_restores_access() {
    let h = harness();
    let root = admin(&h).await;
    let bob = h.auth.register(registration("bob")).await.unwrap().user;
    let now = Utc::now();

    h.moderation
        .block(&root, bob.id, now + TimeDelta::days(7), now)
        .await
        .unwrap();
    h.moderation.unblock(&root, bob.id, now).await.unwrap();

    assert!(h.auth.current_user(bob.id, now).await.is_ok());
}

#[tokio::test]
async fn test_moderation_requires_admin_and_forbids_self() {
    let h = harness();
    let root = admin(&h).await;
    let bob = h.auth.register(registration("bob")).await.unwrap().user;
    let carol = h.auth.register(registration("carol")).await.unwrap().user;
    let now = Utc::now();

    assert!(matches!(
        h.moderation
            .block(&bob, carol.id, now + TimeDelta::hours(1), now)
            .await,
        Err(DomainError::Forbidden(_))
    ));
    assert!(matches!(
        h.moderation
            .list_users(&bob, &UserFilter::default(), PageRequest::default())
            .await,
        Err(DomainError::Forbidden(_))
    ));
    assert!(matches!(
        h.moderation.toggle_role(&root, root.id, now).await,
        Err(DomainError::Forbidden(_))
    ));
    assert!(matches!(
        h.moderation
            .block(&root, carol.id, now - TimeDelta::hours(1), now)
            .await,
        Err(DomainError::Validation(_))
    ));
}

#[tokio::test]
async fn test_toggle_role_promotes_and_demotes() {
    let h = harness();
    let root = admin(&h).await;
    let bob = h.auth.register(registration("bob")).await.unwrap().user;
    let now = Utc::now();

    let promoted = h.moderation.toggle_role(&root, bob.id, now).await.unwrap();
    assert_eq!(promoted.role, Role::Admin);

    let session = h.auth.login("bob", "correct-horse", now).await.unwrap();
    let claims = h.tokens.validate_token(&session.token).unwrap();
    assert!(claims.roles.contains(&"admin".to_string()));

    let demoted = h.moderation.toggle_role(&root, bob.id, now).await.unwrap();
    assert_eq!(demoted.role, Role::User);
}

#[tokio::test]
async fn test_list_users_pages_and_searches() {
    let h = harness();
    let root = admin(&h).await;
    for name in ["anna", "andrew", "bella"] {
        h.auth.register(registration(name)).await.unwrap();
    }

    let all = h
        .moderation
        .list_users(&root, &UserFilter::default(), PageRequest::new(Some(1), Some(2)))
        .await
        .unwrap();
    assert_eq!(all.total_items, 4);
    assert_eq!(all.total_pages, 2);
    assert_eq!(all.items.len(), 2);

    let found = h
        .moderation
        .list_users(
            &root,
            &UserFilter {
                search: Some("an".into()),
            },
            PageRequest::default(),
        )
        .await
        .unwrap();
    let names: Vec<_> = found.items.iter().map(|u| u.username.as_str()).collect();
    assert_eq!(names, vec!["andrew", "anna"]);
}

#[tokio::test]
async fn test_ensure_admin_is_idempotent_and_promotes() {
    let h = harness();
    let existing = h.auth.register(registration("root")).await.unwrap().user;
    assert_eq!(existing.role, Role::User);

    let first = admin(&h).await;
    let second = admin(&h).await;
    assert_eq!(first.id, existing.id);
    assert_eq!(second.id, existing.id);
    assert!(second.is_admin());
}

#[tokio::test]
async fn test_ensure_admin_matches_existing_username() {
    let h = harness();
    let existing = h.auth.register(registration("root")).await.unwrap().user;

    let promoted = h
        .auth
        .ensure_admin(Registration {
            username: "root".to_string(),
            email: "ops@example.com".to_string(),
            password: "correct-horse".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(promoted.id, existing.id);
    assert_eq!(promoted.email, "root@example.com");
    assert!(promoted.is_admin());
}

#[tokio::test]
async fn test_chord_lifecycle_and_permissions() {
    let h = harness();
    let root = admin(&h).await;
    let alice = h.auth.register(registration("alice")).await.unwrap().user;
    let bob = h.auth.register(registration("bob")).await.unwrap().user;

    let chord = h
        .chords
        .create(&alice, new_chord("C major", "x-3-2-0-1-0"))
        .await
        .unwrap();
    assert_eq!(chord.fingering.to_string(), "X32010");

    // Someone else cannot edit it.
    let attempt = h
        .chords
        .update(
            &bob,
            chord.id,
            ChordChanges {
                name: Some("Hijacked".into()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(attempt, Err(DomainError::Forbidden(_))));

    // The author can.
    let updated = h
        .chords
        .update(
            &alice,
            chord.id,
            ChordChanges {
                fingering: Some("X35553".into()),
                description: Some("barred at the third fret".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.fingering.to_string(), "X35553");

    let (_, diagram) = h.chords.diagram(chord.id).await.unwrap();
    assert_eq!(diagram.barre.map(|b| b.fret), Some(3));

    // An admin can delete it.
    assert!(matches!(
        h.chords.delete(&bob, chord.id).await,
        Err(DomainError::Forbidden(_))
    ));
    h.chords.delete(&root, chord.id).await.unwrap();
    assert!(matches!(
        h.chords.get(chord.id).await,
        Err(DomainError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_chord_names_unique_per_author() {
    let h = harness();
    let alice = h.auth.register(registration("alice")).await.unwrap().user;
    let bob = h.auth.register(registration("bob")).await.unwrap().user;

    h.chords.create(&alice, new_chord("G", "320003")).await.unwrap();
    assert!(matches!(
        h.chords.create(&alice, new_chord(" G ", "320033")).await,
        Err(DomainError::Duplicate(_))
    ));
    // Another author may reuse the name.
    h.chords.create(&bob, new_chord("G", "320033")).await.unwrap();

    let d = h.chords.create(&alice, new_chord("D", "XX0232")).await.unwrap();
    let rename = h
        .chords
        .update(
            &alice,
            d.id,
            ChordChanges {
                name: Some("G".into()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(rename, Err(DomainError::Duplicate(_))));
}

#[tokio::test]
async fn test_chord_listing_filters() {
    let h = harness();
    let alice = h.auth.register(registration("alice")).await.unwrap().user;
    let bob = h.auth.register(registration("bob")).await.unwrap().user;

    for (name, fingering) in [("Am", "X02210"), ("A", "X02220"), ("Em", "022000")] {
        h.chords.create(&alice, new_chord(name, fingering)).await.unwrap();
    }
    h.chords.create(&bob, new_chord("Amaj7", "X02120")).await.unwrap();

    let by_search = h
        .chords
        .list(
            &ChordFilter {
                search: Some("am".into()),
                author_id: None,
            },
            PageRequest::default(),
        )
        .await
        .unwrap();
    let names: Vec<_> = by_search.items.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Am", "Amaj7"]);

    let by_author = h
        .chords
        .list(
            &ChordFilter {
                search: None,
                author_id: Some(bob.id),
            },
            PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(by_author.total_items, 1);
}

#[tokio::test]
async fn test_preview_rejects_bad_fingering() {
    assert!(ChordService::preview("133211").is_ok());
    assert!(matches!(
        ChordService::preview("1332"),
        Err(DomainError::Validation(_))
    ));
}
