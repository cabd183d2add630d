// Trust score contract: admin-only counters with saturation at the ceiling
mod util;

use civic_contracts::smart_contracts::trust_score::{ECO_POINTS_KEY, FITNESS_KEY};
use civic_contracts::smart_contracts::{TrustScore, TRUST_SCORE_KEY};
use civic_contracts::*;
use util::*;

fn trust_fixture() -> (Fixture, AppId, Address) {
    let mut fx = Fixture::new();
    let app = fx.deploy(TrustScore::new(&ContractsConfig::default()));
    let citizen = fx.account("citizen", 1_000_000);
    fx.opt_in(citizen, app);
    (fx, app, citizen)
}

#[test]
fn test_opt_in_zeroes_every_counter() {
    let (fx, app, citizen) = trust_fixture();
    for key in [TRUST_SCORE_KEY, FITNESS_KEY, ECO_POINTS_KEY] {
        assert_eq!(fx.local_uint(app, &citizen, key), Some(0), "{}", key);
    }
}

#[test]
fn test_trust_saturates_at_ceiling_and_floors_at_zero() {
    let (mut fx, app, citizen) = trust_fixture();
    let admin = fx.admin;

    fx.call(admin, app, "add_trust", vec![addr(&citizen), uint(95)]).unwrap();
    fx.call(admin, app, "add_trust", vec![addr(&citizen), uint(10)]).unwrap();
    assert_eq!(fx.local_uint(app, &citizen, TRUST_SCORE_KEY), Some(100));

    fx.call(admin, app, "slash_trust", vec![addr(&citizen), uint(30)]).unwrap();
    assert_eq!(fx.local_uint(app, &citizen, TRUST_SCORE_KEY), Some(70));

    fx.call(admin, app, "slash_trust", vec![addr(&citizen), uint(500)]).unwrap();
    assert_eq!(fx.local_uint(app, &citizen, TRUST_SCORE_KEY), Some(0));

    println!("✅ Trust score stays within [0, 100]");
}

#[test]
fn test_fitness_and_eco_accumulate() {
    let (mut fx, app, citizen) = trust_fixture();
    let admin = fx.admin;

    fx.call(admin, app, "add_fitness", vec![addr(&citizen), uint(250)]).unwrap();
    fx.call(admin, app, "add_fitness", vec![addr(&citizen), uint(250)]).unwrap();
    fx.call(admin, app, "add_eco", vec![addr(&citizen), uint(u64::MAX)]).unwrap();

    assert_eq!(fx.local_uint(app, &citizen, FITNESS_KEY), Some(500));
    assert_eq!(
        rejection(fx.call(admin, app, "add_eco", vec![addr(&citizen), uint(1)])),
        Rejection::Overflow
    );
    assert_eq!(fx.local_uint(app, &citizen, ECO_POINTS_KEY), Some(u64::MAX));
}

#[test]
fn test_only_admin_adjusts_scores() {
    let (mut fx, app, citizen) = trust_fixture();

    for op in ["add_trust", "slash_trust", "add_fitness", "add_eco"] {
        assert_eq!(
            rejection(fx.call(citizen, app, op, vec![addr(&citizen), uint(100)])),
            Rejection::NotAdmin,
            "{}",
            op
        );
    }
    for key in [TRUST_SCORE_KEY, FITNESS_KEY, ECO_POINTS_KEY] {
        assert_eq!(fx.local_uint(app, &citizen, key), Some(0), "{}", key);
    }
}

#[test]
fn test_target_must_be_opted_in() {
    let (mut fx, app, _) = trust_fixture();
    let admin = fx.admin;
    let stranger = Address::from_seed(b"stranger");

    assert_eq!(
        rejection(fx.call(admin, app, "add_trust", vec![addr(&stranger), uint(10)])),
        Rejection::NotOptedIn(stranger)
    );
    assert!(matches!(
        rejection(fx.call(admin, app, "add_trust", vec![b"short".to_vec(), uint(10)])),
        Rejection::MalformedArgument(_)
    ));
}

#[test]
fn test_ceiling_follows_config() {
    let mut fx = Fixture::new();
    let admin = fx.admin;
    let config = ContractsConfig {
        score_ceiling: 10,
        ..ContractsConfig::default()
    };
    let app = fx.deploy(TrustScore::new(&config));
    let citizen = fx.account("citizen", 1_000_000);
    fx.opt_in(citizen, app);

    fx.call(admin, app, "add_trust", vec![addr(&citizen), uint(25)]).unwrap();
    assert_eq!(fx.local_uint(app, &citizen, TRUST_SCORE_KEY), Some(10));
}
