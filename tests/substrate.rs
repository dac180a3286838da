mod common;

use std::sync::Arc;

use chain_events::{
    chains::substrate::{
        CallDescription, CollectiveProposalRecord, CollectiveVotesRecord, DepositInfo,
        DispatchEntry, PreimageRecord, PublicProposal, ReferendumInfo, SubstrateBlock,
        SubstrateCall, SubstrateEntityKind, SubstrateEventData, SubstrateExtrinsic,
        SubstrateProcessor, SubstrateRuntimeEvent, SubstrateStorageFetcher, SubstrateSubscriber,
        TreasuryProposalRecord,
    },
    ApiError, EventData, Lifecycle, StorageFetcher, Subscriber,
};
use common::MockSubstrateApi;
use tokio::time::{timeout, Duration};

fn call(method: &str) -> CallDescription {
    CallDescription {
        method: method.to_owned(),
        section: "system".to_owned(),
        args: vec!["0x00".to_owned()],
    }
}

fn populated_api() -> MockSubstrateApi {
    let mut api = MockSubstrateApi::new(1050, 1000);

    api.public_props.push(PublicProposal {
        index: 0,
        hash: "0xprop".to_owned(),
        proposer: "alice".to_owned(),
    });
    api.deposits.insert(0, DepositInfo { balance: 500, depositors: vec!["alice".to_owned()] });

    api.referenda.push(ReferendumInfo {
        index: 1,
        proposal_hash: "0xref".to_owned(),
        vote_threshold: "SuperMajorityApprove".to_owned(),
        end_block: 1200,
    });
    api.dispatch_queue.push(DispatchEntry {
        referendum_index: 0,
        proposal_hash: "0xqueued".to_owned(),
        dispatch_block: 1100,
    });

    api.preimages.insert(
        "0xprop".to_owned(),
        PreimageRecord { noter: "bob".to_owned(), at_block: 42, call: call("remark") },
    );

    api.treasury_count = 2;
    api.treasury_approvals = vec![1];
    api.treasury_proposals.insert(
        0,
        TreasuryProposalRecord {
            proposer: "carol".to_owned(),
            value: 10_000,
            beneficiary: "dave".to_owned(),
            bond: 100,
        },
    );

    api.collective_hashes.insert("council".to_owned(), vec!["0xmotion".to_owned()]);
    api.collective_records.insert(
        ("council".to_owned(), "0xmotion".to_owned()),
        CollectiveProposalRecord { index: 7, threshold: 3, call: call("spend") },
    );
    api.collective_vote_records.insert(
        ("council".to_owned(), "0xmotion".to_owned()),
        CollectiveVotesRecord { ayes: vec!["eve".to_owned()], nays: vec!["mallory".to_owned()] },
    );
    api
}

#[tokio::test]
async fn fetch_walks_all_storage_phases() -> anyhow::Result<()> {
    common::init_tracing();
    let fetcher = SubstrateStorageFetcher::new(Arc::new(populated_api()));
    let events = fetcher.fetch(None, false).await?;

    // proposal + started (active) + started placeholder + passed (queued)
    // + preimage + treasury + collective proposed + two collective votes
    assert_eq!(events.len(), 9);
    for pair in events.windows(2) {
        assert!(pair[0].block_number <= pair[1].block_number);
    }

    // preimages keep their noting block, everything else is dated at head
    let noted = events
        .iter()
        .find(|e| matches!(e.data, SubstrateEventData::PreimageNoted { .. }))
        .unwrap();
    assert_eq!(noted.block_number, 42);
    assert_eq!(noted.exclude_addresses, Some(vec!["bob".to_owned()]));
    for event in &events {
        if !matches!(event.data, SubstrateEventData::PreimageNoted { .. }) {
            assert_eq!(event.block_number, 1000);
        }
    }

    // dispatch-queue referenda synthesize a placeholder started plus passed
    let placeholder = events
        .iter()
        .find(|e| {
            matches!(
                &e.data,
                SubstrateEventData::DemocracyStarted { referendum_index: 0, .. }
            )
        })
        .unwrap();
    assert!(matches!(
        &placeholder.data,
        SubstrateEventData::DemocracyStarted { vote_threshold, end_block: 0, .. }
            if vote_threshold.is_empty()
    ));
    assert!(events.iter().any(|e| e.data
        == SubstrateEventData::DemocracyPassed {
            referendum_index: 0,
            dispatch_block: Some(1100)
        }));

    // approved treasury proposals are skipped
    let treasury: Vec<_> = events
        .iter()
        .filter(|e| matches!(e.data, SubstrateEventData::TreasuryProposed { .. }))
        .collect();
    assert_eq!(treasury.len(), 1);
    assert_eq!(treasury[0].exclude_addresses, Some(vec!["carol".to_owned()]));

    // collective votes come out one per recorded aye and nay
    let votes: Vec<_> = events
        .iter()
        .filter_map(|e| match &e.data {
            SubstrateEventData::CollectiveVoted { voter, vote, .. } => Some((voter.clone(), *vote)),
            _ => None,
        })
        .collect();
    assert_eq!(votes, vec![("eve".to_owned(), true), ("mallory".to_owned(), false)]);
    Ok(())
}

#[tokio::test]
async fn fetch_one_requires_an_entity_kind() -> anyhow::Result<()> {
    let fetcher = SubstrateStorageFetcher::new(Arc::new(populated_api()));

    let err = fetcher.fetch_one("0", None).await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidArgument(_)));

    let events =
        fetcher.fetch_one("0xprop", Some(SubstrateEntityKind::DemocracyPreimage)).await?;
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0].data, SubstrateEventData::PreimageNoted { .. }));

    let events =
        fetcher.fetch_one("0", Some(SubstrateEntityKind::DemocracyProposal)).await?;
    assert_eq!(events.len(), 1);
    assert!(matches!(
        &events[0].data,
        SubstrateEventData::DemocracyProposed { proposal_index: 0, .. }
    ));

    let err = fetcher
        .fetch_one("not-a-number", Some(SubstrateEntityKind::TreasuryProposal))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidArgument(_)));
    Ok(())
}

#[tokio::test]
async fn subscriber_stamps_unversioned_blocks() -> anyhow::Result<()> {
    let api = Arc::new(populated_api());
    let mut subscriber = SubstrateSubscriber::new(api.clone());
    let mut feed = subscriber.subscribe().await?;

    api.push_block(SubstrateBlock {
        number: 10,
        spec_version: None,
        events: vec![],
        extrinsics: vec![],
    })
    .await;
    api.push_block(SubstrateBlock {
        number: 11,
        spec_version: Some(1049),
        events: vec![],
        extrinsics: vec![],
    })
    .await;

    let first = timeout(Duration::from_secs(5), feed.recv()).await?.unwrap();
    assert_eq!(first.spec_version, Some(1050));
    let second = timeout(Duration::from_secs(5), feed.recv()).await?.unwrap();
    assert_eq!(second.spec_version, Some(1049));

    subscriber.unsubscribe();
    assert!(!api.feed_open());
    Ok(())
}

#[tokio::test]
async fn processor_enriches_events_and_successful_votes() -> anyhow::Result<()> {
    use chain_events::Processor;

    let processor = SubstrateProcessor::new(Arc::new(populated_api()));
    let block = SubstrateBlock {
        number: 900,
        spec_version: Some(1050),
        events: vec![
            SubstrateRuntimeEvent::DemocracyProposed { proposal_index: 0, deposit: 500 },
            SubstrateRuntimeEvent::Unknown,
            // no such proposal in storage: enrichment fails, record dropped
            SubstrateRuntimeEvent::DemocracyProposed { proposal_index: 99, deposit: 1 },
        ],
        extrinsics: vec![
            SubstrateExtrinsic {
                success: true,
                call: SubstrateCall::DemocracyVote {
                    voter: "frank".to_owned(),
                    referendum_index: 1,
                    is_aye: true,
                    conviction: 2,
                    balance: 250,
                },
            },
            SubstrateExtrinsic {
                success: false,
                call: SubstrateCall::DemocracyVote {
                    voter: "grace".to_owned(),
                    referendum_index: 1,
                    is_aye: false,
                    conviction: 0,
                    balance: 10,
                },
            },
        ],
    };

    let events = processor.process(block).await;
    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|e| e.block_number == 900));

    assert!(matches!(
        &events[0].data,
        SubstrateEventData::DemocracyProposed { proposal_index: 0, .. }
    ));
    assert_eq!(events[0].exclude_addresses, Some(vec!["alice".to_owned()]));

    assert_eq!(
        events[1].data,
        SubstrateEventData::DemocracyVoted {
            referendum_index: 1,
            who: "frank".to_owned(),
            is_aye: true,
            conviction: 2,
            balance: "250".to_owned(),
        }
    );
    assert_eq!(events[1].exclude_addresses, Some(vec!["frank".to_owned()]));
    Ok(())
}

#[test]
fn classification_covers_all_kinds() {
    use chain_events::chains::substrate::SubstrateEventKind;

    for kind in SubstrateEventKind::ALL {
        let (entity, lifecycle) = SubstrateEventData::classify(kind).unwrap();
        match kind {
            SubstrateEventKind::DemocracyProposed => {
                assert_eq!(entity, SubstrateEntityKind::DemocracyProposal);
                assert_eq!(lifecycle, Lifecycle::Create);
            }
            SubstrateEventKind::PreimageNoted => {
                assert_eq!(entity, SubstrateEntityKind::DemocracyPreimage);
                assert_eq!(lifecycle, Lifecycle::Create);
            }
            SubstrateEventKind::DemocracyVoted | SubstrateEventKind::CollectiveVoted => {
                assert_eq!(lifecycle, Lifecycle::Update);
            }
            _ => {}
        }
    }
}
