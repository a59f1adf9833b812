use crate::shared::cluster::*;

use proptest::prelude::*;

use stripemd::context::OpContext;
use stripemd::fid::Fid;
use stripemd::intent::{Intent, IntentOp};
use stripemd::layout::{FxNameHash, LMV_HASH_TYPE_FNV_1A_64};

const UNKNOWN_HASH: u32 = 0x33;

#[derive(Debug, Clone, Copy)]
enum Step {
    LookupHit,
    LookupMiss,
    LookupRemote,
    LookupBrokenRemote,
    Create,
    StripedLookup,
    StripedCreate,
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        Just(Step::LookupHit),
        Just(Step::LookupMiss),
        Just(Step::LookupRemote),
        Just(Step::LookupBrokenRemote),
        Just(Step::Create),
        Just(Step::StripedLookup),
        Just(Step::StripedCreate),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn lock_grants_are_returned_or_released(
        steps in prop::collection::vec((step(), prop::option::of(0u32..3)), 1..24)
    ) {
        let cluster = Cluster::new(3);
        let dir = Cluster::fid(0, 0x20);
        cluster.shard(0).add_entry(dir, "hit", Cluster::fid(0, 0x21));
        cluster.shard(0).add_remote_entry(dir, "far", Cluster::fid(1, 0x22));
        cluster.shard(1).add_object(attrs_body(Cluster::fid(1, 0x22), libc::S_IFREG as u32, 1));
        cluster.shard(0).add_remote_entry(dir, "gone", Cluster::fid(2, 0x23));

        let (master, layout) = cluster.striped_dir(UNKNOWN_HASH, 3);
        cluster.shard(2).add_entry(layout.stripe(2).unwrap().fid, "foo", Cluster::fid(2, 0x24));
        let (hashed_master, hashed) = cluster.striped_dir(LMV_HASH_TYPE_FNV_1A_64, 3);

        for (n, (step, failing)) in steps.into_iter().enumerate() {
            if let Some(shard) = failing {
                cluster.shard(shard).fail_with(-libc::EIO);
            }

            let (mut ctx, mut it) = match step {
                Step::LookupHit => (OpContext::new(dir).with_name("hit"), Intent::new(IntentOp::Lookup)),
                Step::LookupMiss => (OpContext::new(dir).with_name("miss"), Intent::new(IntentOp::Lookup)),
                Step::LookupRemote => (OpContext::new(dir).with_name("far"), Intent::new(IntentOp::Lookup)),
                Step::LookupBrokenRemote => (OpContext::new(dir).with_name("gone"), Intent::new(IntentOp::Lookup)),
                Step::Create => (
                    OpContext::new(dir).with_name(format!("new{}", n)),
                    Intent::new(IntentOp::OpenCreate),
                ),
                Step::StripedLookup => (
                    OpContext::new(master).with_name("foo").with_parent_layout(layout.clone()),
                    Intent::new(IntentOp::Lookup),
                ),
                Step::StripedCreate => (
                    OpContext::new(hashed_master)
                        .with_name(format!("s{}", n))
                        .with_parent_layout(hashed.clone()),
                    Intent::new(IntentOp::OpenCreate),
                ),
            };

            let result = cluster.resolve(&mut ctx, &mut it);
            prop_assert_eq!(cluster.locks.outstanding(), it.held_locks());
            if result.is_err() {
                prop_assert_eq!(it.held_locks(), 0);
            }

            cluster.locks.release_intent(&mut it);
            prop_assert_eq!(cluster.locks.outstanding(), 0);
            prop_assert_eq!(cluster.locks.granted(), cluster.locks.released());

            if let Some(shard) = failing {
                cluster.shard(shard).recover();
            }
        }
    }

    #[test]
    fn fid_routing_is_deterministic(
        shard in 0u32..4,
        offset in 0u64..SHARD_SEQ_WIDTH,
        oid in 1u32..0x10000,
    ) {
        let cluster = Cluster::new(4);
        let fid = Fid::new(Cluster::seq(shard) + offset, oid, 0);
        let generation = cluster.table.generation();

        let first = cluster.table.target_for(&fid).unwrap().index();
        let second = cluster.table.target_for(&fid).unwrap().index();
        prop_assert_eq!(first, second);
        prop_assert_eq!(first, shard);
        prop_assert_eq!(cluster.table.generation(), generation);
    }

    #[test]
    fn name_routing_is_deterministic(name in "[a-zA-Z0-9._-]{1,32}", stripes in 1u32..8) {
        let cluster = Cluster::new(4);
        let (master, layout) = cluster.striped_dir(LMV_HASH_TYPE_FNV_1A_64, stripes);

        let mut a = OpContext::new(master).with_name(name.clone()).with_parent_layout(layout.clone());
        let mut b = OpContext::new(master).with_name(name.clone()).with_parent_layout(layout.clone());
        let ta = cluster.table.locate(&mut a).unwrap();
        let tb = cluster.table.locate(&mut b).unwrap();

        prop_assert_eq!(ta.index(), tb.index());
        prop_assert_eq!(a.fid1, b.fid1);
        prop_assert_eq!(a.fid1, layout.locate_stripe(&name, &FxNameHash).unwrap().fid);
        prop_assert!(layout.position_of(&a.fid1).is_some());
    }
}
