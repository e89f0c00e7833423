mod common;

use std::time::Duration;

use common::{engine_for, engine_with_ttl, seed_location, seed_user, seed_visitor, test_db};

use parkbench_server::events::RosterEvent;

#[tokio::test]
async fn roster_sorts_parks_and_visitors_by_name() {
    let db = test_db().await;
    let t = engine_for(&db);

    let owner = seed_user(&db, "Uma", "uma@example.com").await;
    let bruno = seed_visitor(&db, &owner.id, "Bruno").await;
    let alice = seed_visitor(&db, &owner.id, "Alice").await;
    let charlie = seed_visitor(&db, &owner.id, "Charlie").await;
    let riverside = seed_location(&db, "Riverside Park").await;
    let central = seed_location(&db, "Central Park").await;

    t.engine
        .check_in(
            &owner.id,
            &[bruno.id.clone(), alice.id.clone()],
            &central.id,
            60,
        )
        .await
        .unwrap();
    t.engine
        .check_in(&owner.id, &[charlie.id.clone()], &riverside.id, 60)
        .await
        .unwrap();

    let roster = t.roster.get(&db).await.unwrap();

    assert_eq!(roster.len(), 2);
    assert_eq!(roster[0].name, "Central Park");
    assert_eq!(roster[1].name, "Riverside Park");

    let central_names: Vec<&str> = roster[0].visitors.iter().map(|v| v.name.as_str()).collect();
    assert_eq!(central_names, vec!["Alice", "Bruno"]);

    assert_eq!(roster[1].visitors.len(), 1);
    assert_eq!(roster[1].visitors[0].name, "Charlie");
}

#[tokio::test]
async fn cached_reads_within_the_ttl_skip_the_store() {
    let db = test_db().await;
    let t = engine_for(&db);

    let owner = seed_user(&db, "Uma", "uma@example.com").await;
    let ana = seed_visitor(&db, &owner.id, "Ana").await;
    let bruno = seed_visitor(&db, &owner.id, "Bruno").await;
    let park = seed_location(&db, "Central Park").await;

    t.engine
        .check_in(&owner.id, &[ana.id.clone()], &park.id, 60)
        .await
        .unwrap();

    let first = t.roster.get(&db).await.unwrap();
    assert_eq!(first[0].visitors.len(), 1);

    // Write a new row behind the cache's back; a fresh read would see it.
    use entity::checkin;
    use parkbench_server::util::{now_ts, uuid_v4};
    use sea_orm::{ActiveModelTrait, Set};
    let now = now_ts();
    checkin::ActiveModel {
        id: Set(uuid_v4()),
        visitor_id: Set(bruno.id.clone()),
        location_id: Set(park.id.clone()),
        checkin_at: Set(now),
        est_checkout_at: Set(now + 3600),
        actual_checkout_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        deleted_at: Set(None),
    }
    .insert(&db)
    .await
    .unwrap();

    // Still within the TTL: the stale snapshot comes back unchanged.
    let second = t.roster.get(&db).await.unwrap();
    assert_eq!(second, first);

    // Invalidation forces the next read to recompute.
    t.roster.invalidate().await;
    let third = t.roster.get(&db).await.unwrap();
    assert_eq!(third[0].visitors.len(), 2);
}

#[tokio::test]
async fn expired_snapshot_always_recomputes() {
    let db = test_db().await;
    let t = engine_with_ttl(&db, Duration::ZERO);

    let owner = seed_user(&db, "Uma", "uma@example.com").await;
    let ana = seed_visitor(&db, &owner.id, "Ana").await;
    let park = seed_location(&db, "Central Park").await;

    let empty = t.roster.get(&db).await.unwrap();
    assert!(empty.is_empty());

    t.engine
        .check_in(&owner.id, &[ana.id.clone()], &park.id, 60)
        .await
        .unwrap();

    // TTL zero: every read observes an expired slot and recomputes.
    let fresh = t.roster.get(&db).await.unwrap();
    assert_eq!(fresh.len(), 1);
}

#[tokio::test]
async fn every_mutation_publishes_a_change_event() {
    let db = test_db().await;
    let t = engine_for(&db);

    let owner = seed_user(&db, "Uma", "uma@example.com").await;
    let ana = seed_visitor(&db, &owner.id, "Ana").await;
    let park = seed_location(&db, "Central Park").await;

    let mut rx = t.events.subscribe();

    let created = t
        .engine
        .check_in(&owner.id, &[ana.id.clone()], &park.id, 60)
        .await
        .unwrap();
    let RosterEvent::RosterChanged { at } = rx.recv().await.unwrap();
    assert_eq!(at, created[0].checkin_at);

    t.engine
        .check_out(&owner.id, &[created[0].id.clone()])
        .await
        .unwrap();
    assert!(matches!(
        rx.recv().await.unwrap(),
        RosterEvent::RosterChanged { .. }
    ));
}
