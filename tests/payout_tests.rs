// Admin payouts: deposit escrow, civic rewards and the prize pool
mod util;

use civic_contracts::smart_contracts::prize_pool::{ADMIN_KEY, MATCH_ID_KEY};
use civic_contracts::smart_contracts::{CivicRewards, DepositEscrow, PrizePool};
use civic_contracts::*;
use util::*;

#[test]
fn test_deposit_escrow_refunds_fixed_amount() {
    let mut fx = Fixture::new();
    let admin = fx.admin;
    let app = fx.deploy(DepositEscrow::new(&ContractsConfig::default()));
    fx.engine.fund(app.address(), 6_000_000).unwrap();
    let borrower = fx.account("borrower", 100_000);

    assert_eq!(
        rejection(fx.call(borrower, app, "return_deposit", vec![addr(&borrower)])),
        Rejection::NotAdmin
    );

    fx.call(admin, app, "return_deposit", vec![addr(&borrower)]).unwrap();
    assert_eq!(fx.engine.balance(&borrower), 5_100_000);

    // A second refund would overdraw the escrow
    assert_eq!(
        rejection(fx.call(admin, app, "return_deposit", vec![addr(&borrower)])),
        Rejection::InsufficientBalance(app.address())
    );
}

#[test]
fn test_deposit_escrow_is_closed() {
    let mut fx = Fixture::new();
    let admin = fx.admin;
    let app = fx.deploy(DepositEscrow::new(&ContractsConfig::default()));
    let borrower = fx.account("borrower", 100_000);
    fx.opt_in(borrower, app);

    let close = Transaction::app_call(borrower, app, OnCompletion::CloseOut, vec![]);
    assert!(matches!(rejection(fx.engine.submit_one(close)), Rejection::CompletionRejected(_)));

    let delete = Transaction::app_call(admin, app, OnCompletion::DeleteApplication, vec![]);
    assert!(matches!(rejection(fx.engine.submit_one(delete)), Rejection::CompletionRejected(_)));
    assert!(fx.engine.application_exists(app));
}

#[test]
fn test_civic_rewards_payout() {
    let mut fx = Fixture::new();
    let admin = fx.admin;
    let app = fx.deploy(CivicRewards::new());
    fx.engine.fund(app.address(), 1_000).unwrap();
    let volunteer = Address::from_seed(b"volunteer");

    fx.call(admin, app, "payout", vec![addr(&volunteer), uint(250)]).unwrap();
    assert_eq!(fx.engine.balance(&volunteer), 250);
    assert_eq!(fx.engine.balance(&app.address()), 750);

    let stranger = fx.account("stranger", 10_000);
    assert_eq!(
        rejection(fx.call(stranger, app, "payout", vec![addr(&stranger), uint(250)])),
        Rejection::NotAdmin
    );
}

#[test]
fn test_prize_pool_pays_balance_minus_fee() {
    let mut fx = Fixture::new();
    let admin = fx.admin;
    let app = fx.deploy(PrizePool::new(&ContractsConfig::default()));

    assert_eq!(fx.engine.global(app, ADMIN_KEY), Some(TealValue::from(admin)));
    assert_eq!(fx.engine.global(app, MATCH_ID_KEY), Some(TealValue::Uint(0)));

    let players = ["p1", "p2", "p3"].map(|seed| fx.account(seed, 1_000_000));
    for player in players {
        let stake = Transaction::payment(player, app.address(), 100_000);
        fx.call_with(stake, player, app, "deposit", vec![]).unwrap();
    }
    assert_eq!(fx.engine.balance(&app.address()), 300_000);

    assert_eq!(
        rejection(fx.call(players[0], app, "payout", vec![addr(&players[0])])),
        Rejection::NotAdmin
    );

    let winner = players[1];
    let before = fx.engine.balance(&winner);
    fx.call(admin, app, "payout", vec![addr(&winner)]).unwrap();
    assert_eq!(fx.engine.balance(&winner), before + 300_000 - Policy::MIN_TXN_FEE);
    assert_eq!(fx.engine.balance(&app.address()), Policy::MIN_TXN_FEE);
}

#[test]
fn test_prize_pool_underflow_and_frozen_code() {
    let mut fx = Fixture::new();
    let admin = fx.admin;
    let app = fx.deploy(PrizePool::new(&ContractsConfig::default()));

    assert_eq!(
        rejection(fx.call(admin, app, "payout", vec![addr(&admin)])),
        Rejection::Underflow
    );

    let update = Transaction::app_call(admin, app, OnCompletion::UpdateApplication, vec![]);
    assert!(matches!(rejection(fx.engine.submit_one(update)), Rejection::CompletionRejected(_)));
}
