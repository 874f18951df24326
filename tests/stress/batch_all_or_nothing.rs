//! Stress tests: a batch verifies completely or not at all.
//!
//! For a batch of N vouches, breaking any single one (at every position
//! k) must fail the whole fetch with that vouch's error, and records
//! after it must never be looked at.

use std::cell::Cell;

use wot_vouch::chain::{ChainLink, LinkBody, MemoryChains, VerifiedUser};
use wot_vouch::error::VouchError;
use wot_vouch::expansion::{ExpansionExtractor, ExpansionId, Sha256Extractor};
use wot_vouch::fetch::{fetch_pending_vouches, PendingVouchApi, PendingVouchResponse};
use wot_vouch::identity::{Kid, LocalIdentity, Seqno, SigId, Uid};
use wot_vouch::pending::{ServerPendingVouch, VouchServices};
use wot_vouch::{CancellationToken, VouchContext};

const BATCH: usize = 12;

fn expansion(i: usize) -> String {
    format!(
        r#"{{"user":{{"eldest":{{"KID":"kid_me","Seqno":1}},"UID":"uid_me","Username":"me"}},"vouch_text":["vouch number {i}"]}}"#
    )
}

fn sig(i: usize) -> SigId {
    SigId::new(format!("sig_{i}"))
}

fn uid(i: usize) -> Uid {
    Uid::new(format!("uid_{i}"))
}

/// One voucher per record, each with a live vouch over `expansion(i)`.
fn batch_chains() -> MemoryChains {
    let mut chains = MemoryChains::new();
    for i in 0..BATCH {
        chains.insert(VerifiedUser {
            uid: uid(i),
            username: format!("voucher{i}"),
            eldest_kid: Kid::new(format!("kid_{i}")),
            eldest_seqno: Seqno(1),
            links: vec![ChainLink {
                seqno: Seqno(2),
                sig_id: sig(i),
                revoked: false,
                body: LinkBody::WotVouch {
                    expansion_id: Sha256Extractor::expansion_id_for(expansion(i).as_bytes()),
                },
            }],
        });
    }
    chains
}

fn batch_records() -> Vec<ServerPendingVouch> {
    (0..BATCH)
        .map(|i| ServerPendingVouch {
            voucher_uid: uid(i),
            voucher_eldest_seqno: Seqno(1),
            sig_id: sig(i),
            expansion_json: expansion(i),
        })
        .collect()
}

struct Canned(Vec<ServerPendingVouch>);

impl PendingVouchApi for Canned {
    fn get_pending(&self, _ctx: &VouchContext) -> wot_vouch::Result<PendingVouchResponse> {
        Ok(PendingVouchResponse {
            status: None,
            pending: self.0.clone(),
        })
    }
}

/// Counts extractions; optionally cancels a token after a number of them.
struct CountingExtractor {
    seen: Cell<usize>,
    cancel_after: Option<(usize, CancellationToken)>,
}

impl CountingExtractor {
    fn new() -> Self {
        Self {
            seen: Cell::new(0),
            cancel_after: None,
        }
    }
}

impl ExpansionExtractor for CountingExtractor {
    fn extract(&self, id: &ExpansionId, expansion_json: &str) -> wot_vouch::Result<Vec<u8>> {
        self.seen.set(self.seen.get() + 1);
        if let Some((after, token)) = &self.cancel_after {
            if self.seen.get() >= *after {
                token.cancel();
            }
        }
        Sha256Extractor.extract(id, expansion_json)
    }
}

fn me() -> LocalIdentity {
    LocalIdentity::new("me", Uid::new("uid_me"), Kid::new("kid_me"))
}

#[test]
fn intact_batch_verifies_in_order() {
    let chains = batch_chains();
    let me = me();
    let services = VouchServices {
        chains: &chains,
        expansions: &Sha256Extractor,
        usernames: &chains,
        me: &me,
    };

    let vouches =
        fetch_pending_vouches(&VouchContext::background(), &Canned(batch_records()), &services)
            .unwrap();
    assert_eq!(vouches.len(), BATCH);
    for (i, vouch) in vouches.iter().enumerate() {
        assert_eq!(vouch.proof(), &sig(i));
        assert_eq!(vouch.voucher().uid, uid(i));
    }
}

#[test]
fn one_tampered_expansion_fails_whole_batch_at_every_position() {
    let chains = batch_chains();
    let me = me();

    for k in 0..BATCH {
        let extractor = CountingExtractor::new();
        let services = VouchServices {
            chains: &chains,
            expansions: &extractor,
            usernames: &chains,
            me: &me,
        };

        let mut records = batch_records();
        records[k].expansion_json = expansion(k).replace("vouch number", "vouch NUMBER");

        let result = fetch_pending_vouches(&VouchContext::background(), &Canned(records), &services);
        let expected_id = Sha256Extractor::expansion_id_for(expansion(k).as_bytes());
        match result {
            Err(VouchError::ExpansionHashMismatch { expansion_id }) => {
                assert_eq!(expansion_id, expected_id.0, "position {k}");
            }
            other => panic!("position {k}: expected ExpansionHashMismatch, got {other:?}"),
        }
        assert_eq!(extractor.seen.get(), k + 1, "position {k}: later records touched");
    }
}

#[test]
fn one_revoked_link_fails_whole_batch_at_every_position() {
    let me = me();

    for k in 0..BATCH {
        let mut chains = batch_chains();
        chains.get_mut(&uid(k)).unwrap().links[0].revoked = true;
        let services = VouchServices {
            chains: &chains,
            expansions: &Sha256Extractor,
            usernames: &chains,
            me: &me,
        };

        let result =
            fetch_pending_vouches(&VouchContext::background(), &Canned(batch_records()), &services);
        match result {
            Err(VouchError::LinkRevoked(sig_id)) => assert_eq!(sig_id, sig(k)),
            other => panic!("position {k}: expected LinkRevoked, got {other:?}"),
        }
    }
}

#[test]
fn first_failure_wins_when_several_are_broken() {
    let chains = batch_chains();
    let me = me();
    let services = VouchServices {
        chains: &chains,
        expansions: &Sha256Extractor,
        usernames: &chains,
        me: &me,
    };

    let mut records = batch_records();
    records[3].sig_id = SigId::new("sig_unknown");
    records[7].expansion_json.push(' ');

    let result = fetch_pending_vouches(&VouchContext::background(), &Canned(records), &services);
    match result {
        Err(VouchError::LinkNotFound { uid: got, sig_id }) => {
            assert_eq!(got, uid(3));
            assert_eq!(sig_id, SigId::new("sig_unknown"));
        }
        other => panic!("expected LinkNotFound, got {other:?}"),
    }
}

#[test]
fn cancellation_mid_batch_discards_partial_results() {
    let chains = batch_chains();
    let me = me();
    let token = CancellationToken::new();
    let extractor = CountingExtractor {
        seen: Cell::new(0),
        cancel_after: Some((BATCH / 2, token.clone())),
    };
    let services = VouchServices {
        chains: &chains,
        expansions: &extractor,
        usernames: &chains,
        me: &me,
    };
    let ctx = VouchContext::background().with_token(token);

    let result = fetch_pending_vouches(&ctx, &Canned(batch_records()), &services);
    assert!(matches!(result, Err(VouchError::Cancelled)));
    assert_eq!(extractor.seen.get(), BATCH / 2);
}
