//! Contract checks shared by every [`AssetStore`] backend.
//!
//! Each function takes a fresh, empty backend and asserts one aspect of the
//! contract. [`run_all`] executes the whole suite with a factory so a backend
//! test module needs a single line to prove it behaves like the others.

use std::future::Future;

use models::Asset;

use crate::errors::StoreError;
use crate::store::{AssetStore, KeyKind};

fn sample(n: u32) -> Asset {
    Asset::new(format!("01:23:45:67:89:{n:02x}"), format!("C{n}"), format!("172.1.0.{n}"))
}

fn by_mac(mut v: Vec<Asset>) -> Vec<Asset> {
    v.sort_by(|a, b| a.mac.cmp(&b.mac));
    v
}

/// Added assets read back unchanged through every identifying attribute.
pub async fn add_then_read_roundtrip<S: AssetStore>(store: &mut S) {
    let asset = sample(1).with_assignee("ABC").with_description("front desk");
    store.add(asset.clone()).await.expect("add");
    assert_eq!(store.read(KeyKind::Mac, &asset.mac).await.expect("by mac"), asset);
    assert_eq!(store.read(KeyKind::Name, &asset.name).await.expect("by name"), asset);
    assert_eq!(store.read(KeyKind::Ip, &asset.ip).await.expect("by ip"), asset);
}

/// A second asset sharing any identifying attribute is rejected.
pub async fn add_rejects_any_collision<S: AssetStore>(store: &mut S) {
    let first = sample(1);
    store.add(first.clone()).await.expect("add first");

    let same_mac = Asset::new(first.mac.clone(), "other", "10.0.0.1");
    let same_name = Asset::new("aa:aa:aa:aa:aa:aa", first.name.clone(), "10.0.0.2");
    let same_ip = Asset::new("bb:bb:bb:bb:bb:bb", "another", first.ip.clone());
    for dup in [same_mac, same_name, same_ip] {
        let res = store.add(dup).await;
        assert!(matches!(res, Err(StoreError::AlreadyExists)), "expected AlreadyExists, got {res:?}");
    }
    let all = store.read_all(KeyKind::All, "").await.expect("read all");
    assert_eq!(all, vec![first]);
}

/// Missing mandatory fields and bad assignee codes are malformed.
pub async fn add_rejects_malformed<S: AssetStore>(store: &mut S) {
    for bad in [
        Asset::new("", "C1", "172.1.0.1"),
        Asset::new("01:23:45:67:89:ab", "", "172.1.0.1"),
        Asset::new("01:23:45:67:89:ab", "C1", ""),
        sample(1).with_assignee("AB"),
        sample(1).with_assignee("ABCD"),
    ] {
        let res = store.add(bad).await;
        assert!(matches!(res, Err(StoreError::Malformed(_))), "expected Malformed, got {res:?}");
    }
    assert!(matches!(store.read_all(KeyKind::All, "").await, Err(StoreError::NotFound)));
}

/// Single reads accept only identifying kinds; group reads only group kinds.
pub async fn key_kinds_are_checked<S: AssetStore>(store: &mut S) {
    store.add(sample(1).with_assignee("ABC")).await.expect("add");
    for kind in [KeyKind::Assignee, KeyKind::Unassigned, KeyKind::All] {
        assert!(matches!(store.read(kind, "ABC").await, Err(StoreError::InvalidKeyKind(k)) if k == kind));
        assert!(matches!(store.delete(kind, "ABC").await, Err(StoreError::InvalidKeyKind(k)) if k == kind));
        assert!(matches!(store.assign(kind, "ABC", "XYZ").await, Err(StoreError::InvalidKeyKind(k)) if k == kind));
    }
    for kind in [KeyKind::Mac, KeyKind::Name, KeyKind::Ip] {
        assert!(matches!(store.read_all(kind, "C1").await, Err(StoreError::InvalidKeyKind(k)) if k == kind));
    }
    assert_eq!(store.read_all(KeyKind::All, "").await.expect("unchanged").len(), 1);
}

/// Lookups on absent keys and empty groups are `NotFound`.
pub async fn missing_is_not_found<S: AssetStore>(store: &mut S) {
    assert!(matches!(store.read_all(KeyKind::All, "").await, Err(StoreError::NotFound)));
    assert!(matches!(store.read_all(KeyKind::Unassigned, "").await, Err(StoreError::NotFound)));
    assert!(matches!(store.delete(KeyKind::Mac, "nope").await, Err(StoreError::NotFound)));

    store.add(sample(1)).await.expect("add");
    assert!(matches!(store.read(KeyKind::Name, "nope").await, Err(StoreError::NotFound)));
    assert!(matches!(store.read_all(KeyKind::Assignee, "ZZZ").await, Err(StoreError::NotFound)));
    assert!(matches!(store.delete(KeyKind::Ip, "nope").await, Err(StoreError::NotFound)));
    assert!(matches!(store.assign(KeyKind::Mac, "nope", "ABC").await, Err(StoreError::NotFound)));
    assert!(matches!(store.unassign(KeyKind::Mac, "nope").await, Err(StoreError::NotFound)));
}

/// Assign then unassign round-trips the asset between the two groups.
pub async fn assign_then_unassign<S: AssetStore>(store: &mut S) {
    let asset = sample(1).with_description("spare");
    store.add(asset.clone()).await.expect("add");
    store.add(sample(2).with_assignee("XYZ")).await.expect("add other");

    store.assign(KeyKind::Name, &asset.name, "ABC").await.expect("assign");
    let owned = store.read_all(KeyKind::Assignee, "ABC").await.expect("owned");
    assert_eq!(owned, vec![asset.clone().with_assignee("ABC")]);
    assert!(matches!(store.read_all(KeyKind::Unassigned, "").await, Err(StoreError::NotFound)));

    store.unassign(KeyKind::Ip, &asset.ip).await.expect("unassign");
    assert_eq!(store.read(KeyKind::Mac, &asset.mac).await.expect("read"), asset);
    assert!(matches!(store.read_all(KeyKind::Assignee, "ABC").await, Err(StoreError::NotFound)));
    assert_eq!(store.read_all(KeyKind::Unassigned, "").await.expect("unassigned"), vec![asset.clone()]);
    assert_eq!(store.read_all(KeyKind::Assignee, "").await.expect("empty assignee"), vec![asset]);
}

/// Assigning validates the code and leaves every other field untouched.
pub async fn assign_validates_and_only_touches_assignee<S: AssetStore>(store: &mut S) {
    let asset = sample(1).with_assignee("ABC").with_description("keep me");
    store.add(asset.clone()).await.expect("add");
    for bad in ["A", "AB", "ABCD"] {
        let res = store.assign(KeyKind::Mac, &asset.mac, bad).await;
        assert!(matches!(res, Err(StoreError::Malformed(_))), "expected Malformed, got {res:?}");
    }
    store.assign(KeyKind::Mac, &asset.mac, "DEF").await.expect("reassign");
    let got = store.read(KeyKind::Mac, &asset.mac).await.expect("read");
    assert_eq!(got, asset.with_assignee("DEF"));
}

/// Assets can be deleted through each identifying attribute.
pub async fn delete_by_each_kind<S: AssetStore>(store: &mut S) {
    let (a, b, c, d) = (sample(1), sample(2), sample(3), sample(4));
    for asset in [&a, &b, &c, &d] {
        store.add(asset.clone()).await.expect("add");
    }
    store.delete(KeyKind::Mac, &a.mac).await.expect("delete by mac");
    store.delete(KeyKind::Name, &b.name).await.expect("delete by name");
    store.delete(KeyKind::Ip, &c.ip).await.expect("delete by ip");
    assert!(matches!(store.read(KeyKind::Mac, &a.mac).await, Err(StoreError::NotFound)));
    assert!(matches!(store.read(KeyKind::Name, &b.name).await, Err(StoreError::NotFound)));
    assert!(matches!(store.read(KeyKind::Ip, &c.ip).await, Err(StoreError::NotFound)));
    assert_eq!(store.read_all(KeyKind::All, "").await.expect("rest"), vec![d]);
}

/// Deleting the only asset leaves an empty store, which is not an error.
pub async fn delete_last_leaves_empty_store<S: AssetStore>(store: &mut S) {
    let asset = Asset::new("01:23:45:67:89:ab", "C1", "172.1.0.1");
    store.add(asset.clone()).await.expect("add");
    assert_eq!(store.read(KeyKind::Name, "C1").await.expect("read"), asset);
    store.delete(KeyKind::Mac, "01:23:45:67:89:ab").await.expect("delete");
    assert!(matches!(store.read_all(KeyKind::All, "").await, Err(StoreError::NotFound)));

    store.add(asset.clone()).await.expect("re-add after delete");
    assert_eq!(store.read(KeyKind::Ip, &asset.ip).await.expect("read again"), asset);
}

/// Group reads partition the store by assignee.
pub async fn read_all_groups_by_assignee<S: AssetStore>(store: &mut S) {
    let owned: Vec<Asset> = (1..=3).map(|n| sample(n).with_assignee("ABC")).collect();
    let other = sample(4).with_assignee("XYZ");
    let free = sample(5);
    for asset in owned.iter().chain([&other, &free]) {
        store.add(asset.clone()).await.expect("add");
    }
    assert_eq!(by_mac(store.read_all(KeyKind::Assignee, "ABC").await.expect("abc")), owned);
    assert_eq!(store.read_all(KeyKind::Assignee, "XYZ").await.expect("xyz"), vec![other]);
    assert_eq!(store.read_all(KeyKind::Unassigned, "ignored").await.expect("free"), vec![free]);
    assert_eq!(store.read_all(KeyKind::All, "ignored").await.expect("all").len(), 5);
}

/// Closing twice is harmless; every other operation afterwards is `Closed`.
pub async fn close_is_idempotent<S: AssetStore>(store: &mut S) {
    let asset = sample(1);
    store.add(asset.clone()).await.expect("add");
    store.close().await.expect("first close");
    store.close().await.expect("second close");

    assert!(matches!(store.read(KeyKind::Mac, &asset.mac).await, Err(StoreError::Closed)));
    assert!(matches!(store.read_all(KeyKind::All, "").await, Err(StoreError::Closed)));
    assert!(matches!(store.add(sample(2)).await, Err(StoreError::Closed)));
    assert!(matches!(store.delete(KeyKind::Mac, &asset.mac).await, Err(StoreError::Closed)));
    assert!(matches!(store.assign(KeyKind::Mac, &asset.mac, "ABC").await, Err(StoreError::Closed)));
    assert!(matches!(store.unassign(KeyKind::Mac, &asset.mac).await, Err(StoreError::Closed)));
}

/// Run every check, each against a fresh backend from `make`.
pub async fn run_all<S, F, Fut>(make: F)
where
    S: AssetStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    add_then_read_roundtrip(&mut make().await).await;
    add_rejects_any_collision(&mut make().await).await;
    add_rejects_malformed(&mut make().await).await;
    key_kinds_are_checked(&mut make().await).await;
    missing_is_not_found(&mut make().await).await;
    assign_then_unassign(&mut make().await).await;
    assign_validates_and_only_touches_assignee(&mut make().await).await;
    delete_by_each_kind(&mut make().await).await;
    delete_last_leaves_empty_store(&mut make().await).await;
    read_all_groups_by_assignee(&mut make().await).await;
    close_is_idempotent(&mut make().await).await;
}
