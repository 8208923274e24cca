//! Concurrent operations must serialize: two withdrawals may never
//! both pass the funds check before either commits, and two callers
//! racing the same status transition may never both win it.

use meridian_core::processing::{BankService, Clock, FixedClock};
use meridian_core::settlement::{MockAchGateway, MockSwiftGateway, OutcomePolicy};
use meridian_core::transaction::{Channel, TransactionStatus};
use meridian_shared::config::BankConfig;
use meridian_shared::types::{Currency, CustomerId, Money};
use rust_decimal_macros::dec;
use std::sync::Arc;

fn service_with_delay(delay_hours: i64) -> Arc<BankService> {
    let config = BankConfig {
        confirmation_delay_hours: delay_hours,
        ..BankConfig::default()
    };
    let clock = Arc::new(FixedClock::new("2026-01-14T12:00:00Z".parse().unwrap()));
    Arc::new(BankService::new(
        config,
        clock as Arc<dyn Clock>,
        Arc::new(MockAchGateway::with_policy(OutcomePolicy::AlwaysAccept)),
        Arc::new(MockSwiftGateway::with_policy(OutcomePolicy::AlwaysAccept)),
    ))
}

fn instant_service() -> Arc<BankService> {
    service_with_delay(0)
}

#[test]
fn concurrent_withdrawals_never_overdraw() {
    let service = instant_service();
    let account = service.open_account(CustomerId::new(), "Race".to_string(), Currency::Usd);
    service
        .create_deposit(
            account.id,
            Money::new(dec!(1000.00), Currency::Usd),
            meridian_core::transaction::DepositSource::Cash,
            Channel::Branch,
            None,
        )
        .unwrap();

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let service = Arc::clone(&service);
            let account_id = account.id;
            std::thread::spawn(move || {
                service
                    .create_withdrawal(
                        account_id,
                        Money::new(dec!(150.00), Currency::Usd),
                        Channel::Online,
                        None,
                    )
                    .map(|txn| txn.status)
            })
        })
        .collect();

    let mut completed = 0u32;
    let mut failed = 0u32;
    for handle in handles {
        match handle.join().expect("thread panicked") {
            Ok(TransactionStatus::Completed) => completed += 1,
            Ok(TransactionStatus::Failed) => failed += 1,
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    // 1000.00 funds 6 withdrawals of 150.00 at most.
    assert_eq!(completed, 6);
    assert_eq!(failed, 4);

    let account = service.account(account.id).unwrap();
    assert_eq!(account.balance().amount, dec!(100.00));
    assert_eq!(account.available_balance().amount, dec!(100.00));
    assert!(!account.balance().is_negative());
}

#[test]
fn opposite_direction_transfers_do_not_deadlock() {
    let service = instant_service();
    let owner_a = CustomerId::new();
    let owner_b = CustomerId::new();
    let a = service.open_account(owner_a, "A".to_string(), Currency::Usd);
    let b = service.open_account(owner_b, "B".to_string(), Currency::Usd);
    for id in [a.id, b.id] {
        service
            .create_deposit(
                id,
                Money::new(dec!(500.00), Currency::Usd),
                meridian_core::transaction::DepositSource::Cash,
                Channel::Branch,
                None,
            )
            .unwrap();
    }

    let mut handles = Vec::new();
    for _ in 0..20 {
        for (from, to_number) in [(a.id, b.account_number.clone()), (b.id, a.account_number.clone())]
        {
            let service = Arc::clone(&service);
            handles.push(std::thread::spawn(move || {
                let destination = meridian_core::transfer::Destination {
                    account_number: to_number,
                    beneficiary_name: "Counterparty".to_string(),
                    ..meridian_core::transfer::Destination::default()
                };
                service
                    .create_transfer(
                        from,
                        destination,
                        Money::new(dec!(5.00), Currency::Usd),
                        Channel::Online,
                        None,
                    )
                    .map(|(txn, _)| txn.status)
            }));
        }
    }
    for handle in handles {
        let status = handle.join().expect("thread panicked").unwrap();
        assert_eq!(status, TransactionStatus::Completed);
    }

    // Equal flow in both directions: balances end where they started.
    assert_eq!(service.account(a.id).unwrap().balance().amount, dec!(500.00));
    assert_eq!(service.account(b.id).unwrap().balance().amount, dec!(500.00));
}

#[test]
fn concurrent_confirms_credit_exactly_once() {
    let service = service_with_delay(24);
    let account = service.open_account(CustomerId::new(), "Race".to_string(), Currency::Usd);

    for _ in 0..50 {
        let txn = service
            .create_deposit(
                account.id,
                Money::new(dec!(100.00), Currency::Usd),
                meridian_core::transaction::DepositSource::Cash,
                Channel::Branch,
                None,
            )
            .unwrap();
        assert_eq!(txn.status, TransactionStatus::Pending);

        let barrier = Arc::new(std::sync::Barrier::new(2));
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let service = Arc::clone(&service);
                let barrier = Arc::clone(&barrier);
                let id = txn.id;
                std::thread::spawn(move || {
                    barrier.wait();
                    service.confirm(id).is_ok()
                })
            })
            .collect();

        let mut wins = 0u32;
        for handle in handles {
            if handle.join().expect("thread panicked") {
                wins += 1;
            }
        }
        assert_eq!(wins, 1);
        assert_eq!(
            service.transaction_by_id(txn.id).unwrap().status,
            TransactionStatus::Completed
        );
    }

    // 50 deposits of 100.00, each credited exactly once.
    assert_eq!(
        service.account(account.id).unwrap().balance().amount,
        dec!(5000.00)
    );
}

#[test]
fn cancel_never_overwrites_a_concurrent_confirm() {
    let service = service_with_delay(24);
    let account = service.open_account(CustomerId::new(), "Race".to_string(), Currency::Usd);

    let mut expected = dec!(0.00);
    for _ in 0..50 {
        let txn = service
            .create_deposit(
                account.id,
                Money::new(dec!(100.00), Currency::Usd),
                meridian_core::transaction::DepositSource::Cash,
                Channel::Branch,
                None,
            )
            .unwrap();
        assert_eq!(txn.status, TransactionStatus::Pending);

        let barrier = Arc::new(std::sync::Barrier::new(2));
        let confirm = {
            let service = Arc::clone(&service);
            let barrier = Arc::clone(&barrier);
            let id = txn.id;
            std::thread::spawn(move || {
                barrier.wait();
                service.confirm(id).is_ok()
            })
        };
        let cancel = {
            let service = Arc::clone(&service);
            let barrier = Arc::clone(&barrier);
            let id = txn.id;
            std::thread::spawn(move || {
                barrier.wait();
                service.cancel(id).is_ok()
            })
        };
        let confirmed = confirm.join().expect("thread panicked");
        let cancelled = cancel.join().expect("thread panicked");
        assert!(confirmed ^ cancelled, "exactly one transition may win");

        let stored = service.transaction_by_id(txn.id).unwrap();
        match stored.status {
            TransactionStatus::Completed => expected += dec!(100.00),
            TransactionStatus::Cancelled => {}
            other => panic!("unexpected status: {other:?}"),
        }
    }

    // The balance reflects exactly the deposits whose confirm won.
    assert_eq!(
        service.account(account.id).unwrap().balance().amount,
        expected
    );
}
