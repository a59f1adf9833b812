use crate::shared::cluster::*;

use stripemd::context::OpContext;
use stripemd::error::MdError;
use stripemd::fid::{Fid, FID_SEQ_NORMAL};
use stripemd::intent::{Intent, IntentOp};
use stripemd::lock::LockMode;

#[test]
#[should_panic(expected = "readdir")]
fn test_readdir_is_a_contract_violation() {
    let cluster = Cluster::new(1);
    let mut ctx = OpContext::new(Cluster::fid(0, 1));
    let mut it = Intent::new(IntentOp::Readdir);
    let _ = cluster.resolve(&mut ctx, &mut it);
}

#[test]
fn test_insane_primary_is_stale() {
    let cluster = Cluster::new(1);
    let mut ctx = OpContext::new(Fid::new(FID_SEQ_NORMAL, 1, 9)).with_name("x");
    let mut it = Intent::new(IntentOp::Lookup);
    let err = cluster.resolve(&mut ctx, &mut it).unwrap_err();

    assert!(matches!(err, MdError::Stale(_)));
    assert_eq!(err.errno(), -libc::ESTALE);
    assert!(cluster.calls().is_empty());
}

#[test]
fn test_unowned_fid_is_a_routing_error() {
    let cluster = Cluster::new(2);
    let stray = Fid::new(Cluster::seq(9), 1, 0);
    let mut ctx = OpContext::new(stray).with_name("x");
    let mut it = Intent::new(IntentOp::Lookup);
    let err = cluster.resolve(&mut ctx, &mut it).unwrap_err();

    assert!(err.is_routing());
    assert_eq!(err.errno(), -libc::ENODEV);
}

#[test]
fn test_failure_releases_locks_already_held() {
    let cluster = Cluster::new(2);
    cluster.shard(1).fail_with(-libc::EIO);

    let mut ctx = OpContext::new(Cluster::fid(1, 0x20)).with_name("x");
    let mut it = Intent::new(IntentOp::Lookup);
    it.lock = Some(cluster.locks.grant(LockMode::Cr));
    it.remote_lock = Some(cluster.locks.grant(LockMode::Pr));

    cluster.resolve(&mut ctx, &mut it).unwrap_err();
    assert_eq!(it.held_locks(), 0);
    assert_eq!(cluster.locks.outstanding(), 0);
    assert_eq!(cluster.locks.released(), 2);
}

#[test]
fn test_layout_intent_goes_through_lookup() {
    let cluster = Cluster::new(2);
    let fid = Cluster::fid(0, 0x30);
    cluster.shard(0).add_object(attrs_body(fid, libc::S_IFREG as u32, 10));

    let mut ctx = OpContext::new(fid);
    let mut it = Intent::new(IntentOp::Layout);
    cluster.resolve(&mut ctx, &mut it).unwrap();

    assert_eq!(cluster.calls()[0].op, IntentOp::Layout);
    assert_eq!(it.lock.unwrap().mode, LockMode::Pr);
}
