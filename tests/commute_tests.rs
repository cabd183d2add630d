// Commute check-in: rider fares escrowed until the trip ends or is cancelled
mod util;

use civic_contracts::smart_contracts::commute::{COLLATERAL_KEY, ROLE_KEY, TRIP_ACTIVE_KEY};
use civic_contracts::smart_contracts::CommuteCheckin;
use civic_contracts::*;
use util::*;

const FARE: Amount = 750_000;

fn commute_fixture() -> (Fixture, AppId, Address, Address) {
    let mut fx = Fixture::new();
    let app = fx.deploy(CommuteCheckin::new());
    let rider = fx.account("rider", 5_000_000);
    let driver = fx.account("driver", 1_000_000);
    for account in [rider, driver] {
        fx.opt_in(account, app);
    }
    fx.call(rider, app, "register_rider", vec![]).unwrap();
    fx.call(driver, app, "register_driver", vec![]).unwrap();
    (fx, app, rider, driver)
}

fn start_trip(fx: &mut Fixture, app: AppId, rider: Address, fare: Amount) -> Result<GroupReceipt> {
    let payment = Transaction::payment(rider, fx.engine.application_address(app), fare);
    fx.call_with(payment, rider, app, "start_trip", vec![])
}

#[test]
fn test_opt_in_defaults_before_registration() {
    let mut fx = Fixture::new();
    let app = fx.deploy(CommuteCheckin::new());
    let rider = fx.account("rider", 1_000_000);
    fx.opt_in(rider, app);

    assert_eq!(fx.local_bytes(app, &rider, ROLE_KEY), Some(b"none".to_vec()));
    assert_eq!(fx.local_uint(app, &rider, TRIP_ACTIVE_KEY), Some(0));
    assert_eq!(fx.local_uint(app, &rider, COLLATERAL_KEY), Some(0));
}

#[test]
fn test_registration_sets_roles() {
    let (fx, app, rider, driver) = commute_fixture();
    assert_eq!(fx.local_bytes(app, &rider, ROLE_KEY), Some(b"rider".to_vec()));
    assert_eq!(fx.local_bytes(app, &driver, ROLE_KEY), Some(b"driver".to_vec()));
    assert_eq!(fx.local_uint(app, &rider, TRIP_ACTIVE_KEY), Some(0));
}

#[test]
fn test_completed_trip_pays_driver() {
    let (mut fx, app, rider, driver) = commute_fixture();
    let driver_before = fx.engine.balance(&driver);

    start_trip(&mut fx, app, rider, FARE).unwrap();
    assert_eq!(fx.local_uint(app, &rider, TRIP_ACTIVE_KEY), Some(1));
    assert_eq!(fx.local_uint(app, &rider, COLLATERAL_KEY), Some(FARE));

    fx.call(rider, app, "end_trip", vec![addr(&driver)]).unwrap();
    assert_eq!(fx.engine.balance(&driver), driver_before + FARE);
    assert_eq!(fx.local_uint(app, &rider, TRIP_ACTIVE_KEY), Some(0));
    assert_eq!(fx.local_uint(app, &rider, COLLATERAL_KEY), Some(0));
    assert_eq!(fx.engine.balance(&fx.engine.application_address(app)), 0);
}

#[test]
fn test_cancelled_trip_refunds_rider() {
    let (mut fx, app, rider, _) = commute_fixture();
    let rider_before = fx.engine.balance(&rider);

    start_trip(&mut fx, app, rider, FARE).unwrap();
    fx.call(rider, app, "cancel_trip", vec![]).unwrap();

    assert_eq!(fx.engine.balance(&rider), rider_before - 3 * Policy::MIN_TXN_FEE);
    assert_eq!(fx.local_uint(app, &rider, TRIP_ACTIVE_KEY), Some(0));
}

#[test]
fn test_trip_guards() {
    let (mut fx, app, rider, driver) = commute_fixture();

    assert!(matches!(
        rejection(fx.call(rider, app, "end_trip", vec![addr(&driver)])),
        Rejection::Precondition(_)
    ));
    assert!(matches!(
        rejection(fx.call(rider, app, "cancel_trip", vec![])),
        Rejection::Precondition(_)
    ));
    assert!(matches!(
        rejection(start_trip(&mut fx, app, driver, FARE)),
        Rejection::Precondition(_)
    ));
    assert!(matches!(
        rejection(start_trip(&mut fx, app, rider, 0)),
        Rejection::CompanionMismatch { position: 0, .. }
    ));
    assert_eq!(
        rejection(fx.call(rider, app, "start_trip", vec![])),
        Rejection::GroupSize { expected: 2, actual: 1 }
    );
    let misdirected = Transaction::payment(rider, driver, FARE);
    assert!(matches!(
        rejection(fx.call_with(misdirected, rider, app, "start_trip", vec![])),
        Rejection::CompanionMismatch { position: 0, .. }
    ));
    assert_eq!(fx.local_uint(app, &rider, TRIP_ACTIVE_KEY), Some(0));

    start_trip(&mut fx, app, rider, FARE).unwrap();
    assert!(matches!(
        rejection(start_trip(&mut fx, app, rider, FARE)),
        Rejection::Precondition(_)
    ));
    assert_eq!(fx.local_uint(app, &rider, COLLATERAL_KEY), Some(FARE));
}
