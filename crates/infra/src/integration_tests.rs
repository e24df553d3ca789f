//! Integration tests for the full settlement pipeline.
//!
//! Tests: Operation → Store (transaction scope) → Bus → Projection → ReadModel
//!
//! Verifies:
//! - The markup floor holds through every pricing path
//! - Settlement math and the commission split survive the whole pipeline
//! - Stock, order, and payout atomicity under concurrent callers
//! - Placed orders are immune to later catalog edits

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal_macros::dec;
    use serde_json::Value as JsonValue;

    use vendora_auth::{Caller, Role};
    use vendora_catalog::{BindingUpdate, NewBinding, Product, ProductId, ProductUpdate};
    use vendora_core::{DomainError, Entity, Money, UserId};
    use vendora_events::{EventBus, EventEnvelope, InMemoryEventBus, Projection};
    use vendora_orders::{
        CartLine, CustomerInfo, FlatRateShipping, OrderId, OrderStatus, PaymentStatus,
        SettlementConfig, ShippingAddress,
    };
    use vendora_parties::{Manufacturer, Reseller};
    use vendora_payouts::PayoutStatus;

    use crate::engine::{EngineConfig, EngineError, SettlementEngine};
    use crate::projections::reseller_stats::{OrderSummary, ResellerStatsProjection};
    use crate::read_model::InMemoryOwnerStore;
    use crate::store::{InMemoryStore, Store};

    type Bus = Arc<InMemoryEventBus<EventEnvelope<JsonValue>>>;
    type Engine = SettlementEngine<Arc<InMemoryStore>, Bus>;
    type StatsProjection =
        ResellerStatsProjection<Arc<InMemoryOwnerStore<OrderId, OrderSummary>>>;

    fn setup() -> (Arc<Engine>, Arc<StatsProjection>) {
        let store = Arc::new(InMemoryStore::new());
        let bus: Bus = Arc::new(InMemoryEventBus::new());
        let engine = Arc::new(
            SettlementEngine::new(store, bus.clone())
                .with_shipping_policy(Box::new(FlatRateShipping(Money::from_major(50)))),
        );

        let projection = Arc::new(ResellerStatsProjection::new(Arc::new(
            InMemoryOwnerStore::new(),
        )));

        // Subscribe to the bus BEFORE any events are published.
        let projection_clone = projection.clone();
        let bus_clone = bus.clone();
        let (ready_tx, ready_rx) = std::sync::mpsc::channel::<()>();
        std::thread::spawn(move || {
            let sub = bus_clone.subscribe();
            let _ = ready_tx.send(());
            while let Ok(env) = sub.recv() {
                projection_clone.apply(&env);
            }
        });
        // Ensure the subscriber is ready before returning (prevents missing
        // early events).
        let _ = ready_rx.recv_timeout(std::time::Duration::from_secs(1));

        (engine, projection)
    }

    /// The subscriber thread applies events asynchronously.
    fn wait_for_processing() {
        std::thread::sleep(std::time::Duration::from_millis(50));
    }

    fn admin() -> Caller {
        Caller::new(UserId::new(), Role::Admin)
    }

    /// A manufacturer with a 20% markup floor.
    fn seed_manufacturer(engine: &Engine) -> (Caller, Manufacturer) {
        let caller = Caller::new(UserId::new(), Role::Manufacturer);
        let m = engine
            .register_manufacturer(&caller, "Forge Works", dec!(20))
            .unwrap();
        (caller, m)
    }

    /// An onboarded, published reseller.
    fn seed_reseller(engine: &Engine, slug: &str) -> (Caller, Reseller) {
        let caller = Caller::new(UserId::new(), Role::Reseller);
        engine
            .register_reseller(&caller, "Acme Stores", slug)
            .unwrap();
        engine.complete_onboarding(&caller).unwrap();
        let r = engine.publish_storefront(&caller).unwrap();
        (caller, r)
    }

    fn seed_product(engine: &Engine, maker: &Caller, sku: &str, base: i64, stock: i64) -> Product {
        let p = engine
            .create_product(maker, sku, "Forge Anvil", Money::from_major(base))
            .unwrap();
        if stock > 0 {
            return engine.restock_product(maker, *p.id(), stock).unwrap();
        }
        p
    }

    fn customer() -> CustomerInfo {
        CustomerInfo {
            name: "Jordan Blake".to_string(),
            email: "jordan@example.com".to_string(),
            phone: None,
        }
    }

    fn address() -> ShippingAddress {
        ShippingAddress {
            line1: "1 Foundry Lane".to_string(),
            line2: None,
            city: "Pune".to_string(),
            state: "MH".to_string(),
            postal_code: "411001".to_string(),
            country: "IN".to_string(),
        }
    }

    fn cart(product_id: ProductId, quantity: i64) -> Vec<CartLine> {
        vec![CartLine {
            product_id,
            quantity,
        }]
    }

    fn domain_err(err: EngineError) -> DomainError {
        match err {
            EngineError::Domain(e) => e,
            other => panic!("expected domain error, got {other:?}"),
        }
    }

    #[test]
    fn floor_holds_through_every_pricing_path() {
        let (engine, _) = setup();
        let (maker, _) = seed_manufacturer(&engine);
        let (shop, _) = seed_reseller(&engine, "acme-stores");
        let product = seed_product(&engine, &maker, "SKU-001", 1000, 10);

        // Floor for base 1000 at 20% is 1200, inclusive.
        let err = engine
            .list_product(&shop, *product.id(), NewBinding::at_price(Money::new(dec!(1199.99))))
            .unwrap_err();
        assert!(matches!(domain_err(err), DomainError::PriceBelowFloor { .. }));

        let binding = engine
            .list_product(&shop, *product.id(), NewBinding::at_price(Money::from_major(1200)))
            .unwrap();

        // Updates revalidate against the floor as it stands now.
        engine.set_markup_floor(&maker, dec!(50)).unwrap();
        let err = engine
            .update_listing(
                &shop,
                *binding.id(),
                BindingUpdate {
                    retail_price: Some(Money::from_major(1300)),
                    ..BindingUpdate::default()
                },
            )
            .unwrap_err();
        assert!(matches!(domain_err(err), DomainError::PriceBelowFloor { .. }));

        // The raised floor never touches the existing price on its own.
        let unchanged = engine.store().binding(*binding.id()).unwrap();
        assert_eq!(unchanged.retail_price(), Money::from_major(1200));
    }

    #[test]
    fn duplicate_listing_is_a_conflict() {
        let (engine, _) = setup();
        let (maker, _) = seed_manufacturer(&engine);
        let (shop, _) = seed_reseller(&engine, "acme-stores");
        let product = seed_product(&engine, &maker, "SKU-001", 1000, 10);

        engine
            .list_product(&shop, *product.id(), NewBinding::at_price(Money::from_major(1200)))
            .unwrap();
        let err = engine
            .list_product(&shop, *product.id(), NewBinding::at_price(Money::from_major(1300)))
            .unwrap_err();
        assert_eq!(domain_err(err), DomainError::DuplicateBinding);
    }

    #[test]
    fn bulk_reprice_is_partial_success() {
        let (engine, _) = setup();
        let (maker_a, _) = seed_manufacturer(&engine);
        let maker_b = Caller::new(UserId::new(), Role::Manufacturer);
        engine
            .register_manufacturer(&maker_b, "Steel Co", dec!(40))
            .unwrap();

        let (shop, _) = seed_reseller(&engine, "acme-stores");
        let low_floor = seed_product(&engine, &maker_a, "SKU-A", 1000, 10);
        let high_floor = seed_product(&engine, &maker_b, "SKU-B", 500, 10);

        engine
            .list_product(&shop, *low_floor.id(), NewBinding::at_price(Money::from_major(1500)))
            .unwrap();
        engine
            .list_product(&shop, *high_floor.id(), NewBinding::at_price(Money::from_major(800)))
            .unwrap();

        // 30% clears the 20% floor but not the 40% one.
        let outcomes = engine.bulk_reprice(&shop, dec!(30)).unwrap();
        assert_eq!(outcomes.len(), 2);

        let by_product = |id: ProductId| {
            outcomes
                .iter()
                .find(|o| o.product_id == id)
                .unwrap()
                .result
                .clone()
        };
        assert_eq!(by_product(*low_floor.id()), Ok(Money::from_major(1300)));
        assert!(matches!(
            by_product(*high_floor.id()),
            Err(DomainError::PriceBelowFloor { .. })
        ));

        // The failed listing kept its old price.
        let listings = engine.management_view(&shop).unwrap();
        let kept = listings
            .iter()
            .find(|l| l.binding.product_id() == *high_floor.id())
            .unwrap();
        assert_eq!(kept.binding.retail_price(), Money::from_major(800));
    }

    #[test]
    fn settlement_splits_the_order_total() {
        let (engine, _) = setup();
        let (maker, _) = seed_manufacturer(&engine);
        let (shop, _) = seed_reseller(&engine, "acme-stores");
        let anvil = seed_product(&engine, &maker, "SKU-A", 1000, 10);
        let tongs = seed_product(&engine, &maker, "SKU-B", 500, 10);

        engine
            .list_product(&shop, *anvil.id(), NewBinding::at_price(Money::from_major(1500)))
            .unwrap();
        engine
            .list_product(&shop, *tongs.id(), NewBinding::at_price(Money::from_major(600)))
            .unwrap();

        let order = engine
            .place_order(
                "acme-stores",
                &[
                    CartLine { product_id: *anvil.id(), quantity: 2 },
                    CartLine { product_id: *tongs.id(), quantity: 1 },
                ],
                customer(),
                address(),
                None,
            )
            .unwrap();

        // subtotal 3600, flat shipping 50, 18% tax on the subtotal only.
        assert_eq!(order.subtotal(), Money::from_major(3600));
        assert_eq!(order.shipping_cost(), Money::from_major(50));
        assert_eq!(order.tax_amount(), Money::from_major(648));
        assert_eq!(order.total_amount(), Money::from_major(4298));
        assert_eq!(order.reseller_commission(), Money::from_major(1100));
        assert_eq!(order.manufacturer_amount(), Money::from_major(3198));
        assert_eq!(
            order.reseller_commission() + order.manufacturer_amount(),
            order.total_amount()
        );

        // Stock committed with the order.
        assert_eq!(engine.store().product(*anvil.id()).unwrap().stock_quantity(), 8);
        assert_eq!(engine.store().product(*tongs.id()).unwrap().stock_quantity(), 9);
        assert_eq!(engine.products(&maker).unwrap().len(), 2);
    }

    #[test]
    fn placed_orders_are_immune_to_catalog_edits() {
        let (engine, _) = setup();
        let (maker, _) = seed_manufacturer(&engine);
        let (shop, _) = seed_reseller(&engine, "acme-stores");
        let product = seed_product(&engine, &maker, "SKU-001", 1000, 10);
        let binding = engine
            .list_product(&shop, *product.id(), NewBinding::at_price(Money::from_major(1500)))
            .unwrap();

        let order = engine
            .place_order("acme-stores", &cart(*product.id(), 1), customer(), address(), None)
            .unwrap();

        engine
            .update_listing(
                &shop,
                *binding.id(),
                BindingUpdate {
                    retail_price: Some(Money::from_major(2000)),
                    ..BindingUpdate::default()
                },
            )
            .unwrap();
        engine
            .set_base_price(&maker, *product.id(), Money::from_major(1200))
            .unwrap();
        engine.remove_listing(&shop, *binding.id()).unwrap();
        engine
            .set_product_active(&maker, *product.id(), false)
            .unwrap();

        let reloaded = engine.order(&shop, *order.id()).unwrap();
        assert_eq!(reloaded.subtotal(), Money::from_major(1500));
        assert_eq!(reloaded.items()[0].unit_price, Money::from_major(1500));
        assert_eq!(reloaded.items()[0].base_price, Money::from_major(1000));
    }

    #[test]
    fn removing_a_listing_frees_the_pair() {
        let (engine, _) = setup();
        let (maker, _) = seed_manufacturer(&engine);
        let (shop, _) = seed_reseller(&engine, "acme-stores");
        let product = seed_product(&engine, &maker, "SKU-001", 1000, 10);
        let binding = engine
            .list_product(&shop, *product.id(), NewBinding::at_price(Money::from_major(1200)))
            .unwrap();

        engine.remove_listing(&shop, *binding.id()).unwrap();
        assert!(engine.management_view(&shop).unwrap().is_empty());

        // The (reseller, product) pair can be listed again.
        engine
            .list_product(&shop, *product.id(), NewBinding::at_price(Money::from_major(1300)))
            .unwrap();
    }

    #[test]
    fn racing_orders_for_the_last_unit_settle_exactly_once() {
        let (engine, _) = setup();
        let (maker, _) = seed_manufacturer(&engine);
        let (shop, _) = seed_reseller(&engine, "acme-stores");
        let product = seed_product(&engine, &maker, "SKU-001", 1000, 1);
        engine
            .list_product(&shop, *product.id(), NewBinding::at_price(Money::from_major(1200)))
            .unwrap();

        let barrier = Arc::new(std::sync::Barrier::new(2));
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let engine = engine.clone();
                let barrier = barrier.clone();
                let product_id = *product.id();
                std::thread::spawn(move || {
                    barrier.wait();
                    engine.place_order(
                        "acme-stores",
                        &cart(product_id, 1),
                        customer(),
                        address(),
                        None,
                    )
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let oks = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(oks, 1, "exactly one order may claim the last unit");

        let failure = results.into_iter().find(Result::is_err).unwrap().unwrap_err();
        assert_eq!(
            domain_err(failure),
            DomainError::InsufficientStock { available: 0, requested: 1 }
        );
        assert_eq!(engine.store().product(*product.id()).unwrap().stock_quantity(), 0);
    }

    #[test]
    fn a_rejected_cart_leaves_stock_untouched() {
        let (engine, _) = setup();
        let (maker, _) = seed_manufacturer(&engine);
        let (shop, _) = seed_reseller(&engine, "acme-stores");
        let product = seed_product(&engine, &maker, "SKU-001", 1000, 5);
        engine
            .list_product(&shop, *product.id(), NewBinding::at_price(Money::from_major(1200)))
            .unwrap();

        // Two lines of the same product draw on the same stock: 3 + 3 > 5.
        let err = engine
            .place_order(
                "acme-stores",
                &[
                    CartLine { product_id: *product.id(), quantity: 3 },
                    CartLine { product_id: *product.id(), quantity: 3 },
                ],
                customer(),
                address(),
                None,
            )
            .unwrap_err();
        assert_eq!(
            domain_err(err),
            DomainError::InsufficientStock { available: 5, requested: 6 }
        );

        // All-or-nothing: the failed cart decremented nothing.
        assert_eq!(engine.store().product(*product.id()).unwrap().stock_quantity(), 5);
    }

    #[test]
    fn lifecycle_must_pass_through_every_stage() {
        let (engine, _) = setup();
        let (maker, _) = seed_manufacturer(&engine);
        let (shop, _) = seed_reseller(&engine, "acme-stores");
        let product = seed_product(&engine, &maker, "SKU-001", 1000, 10);
        engine
            .list_product(&shop, *product.id(), NewBinding::at_price(Money::from_major(1200)))
            .unwrap();
        let order = engine
            .place_order("acme-stores", &cart(*product.id(), 1), customer(), address(), None)
            .unwrap();

        // Pending cannot jump to Shipped.
        let err = engine
            .update_order_status(&shop, *order.id(), OrderStatus::Shipped)
            .unwrap_err();
        assert!(matches!(domain_err(err), DomainError::InvalidTransition { .. }));

        for next in [
            OrderStatus::Confirmed,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
        ] {
            engine.update_order_status(&shop, *order.id(), next).unwrap();
        }

        engine
            .update_order_fulfilment(
                &shop,
                *order.id(),
                Some("TRK-9001".to_string()),
                None,
                Some("left at the loading dock".to_string()),
            )
            .unwrap();

        // Payment settles outside the engine; only admins book the outcome.
        let err = engine
            .record_payment(&shop, *order.id(), PaymentStatus::Paid)
            .unwrap_err();
        assert_eq!(domain_err(err), DomainError::AccessDenied);
        engine
            .record_payment(&admin(), *order.id(), PaymentStatus::Paid)
            .unwrap();

        let delivered = engine.order(&shop, *order.id()).unwrap();
        assert!(delivered.shipped_at().is_some());
        assert!(delivered.delivered_at().is_some());
        assert_eq!(delivered.tracking_number(), Some("TRK-9001"));
        assert_eq!(delivered.internal_notes(), Some("left at the loading dock"));
        assert_eq!(delivered.payment_status(), PaymentStatus::Paid);

        // Delivered is terminal.
        let err = engine
            .update_order_status(&admin(), *order.id(), OrderStatus::Cancelled)
            .unwrap_err();
        assert!(matches!(domain_err(err), DomainError::OrderAlreadyFinalized { .. }));
    }

    #[test]
    fn reseller_cannot_touch_a_foreign_order() {
        let (engine, _) = setup();
        let (maker, _) = seed_manufacturer(&engine);
        let (shop, _) = seed_reseller(&engine, "acme-stores");
        let (other, _) = seed_reseller(&engine, "rival-stores");
        let product = seed_product(&engine, &maker, "SKU-001", 1000, 10);
        engine
            .list_product(&shop, *product.id(), NewBinding::at_price(Money::from_major(1200)))
            .unwrap();
        let order = engine
            .place_order("acme-stores", &cart(*product.id(), 1), customer(), address(), None)
            .unwrap();

        let err = engine
            .update_order_status(&other, *order.id(), OrderStatus::Confirmed)
            .unwrap_err();
        assert_eq!(domain_err(err), DomainError::AccessDenied);

        // Admins may move any order.
        engine
            .update_order_status(&admin(), *order.id(), OrderStatus::Confirmed)
            .unwrap();
    }

    /// Deliver one order and return its commission.
    fn earn_commission(engine: &Engine, maker: &Caller, shop: &Caller, slug: &str) -> Money {
        let product = seed_product(engine, maker, &format!("SKU-{}", slug.len()), 1000, 10);
        engine
            .list_product(shop, *product.id(), NewBinding::at_price(Money::from_major(1500)))
            .unwrap();
        let order = engine
            .place_order(slug, &cart(*product.id(), 1), customer(), address(), None)
            .unwrap();
        for next in [
            OrderStatus::Confirmed,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
        ] {
            engine.update_order_status(shop, *order.id(), next).unwrap();
        }
        order.reseller_commission()
    }

    #[test]
    fn balance_is_derived_and_payouts_lock_it() {
        let (engine, _) = setup();
        let (maker, _) = seed_manufacturer(&engine);
        let (shop, _) = seed_reseller(&engine, "acme-stores");

        // Nothing earned yet: no payout.
        let err = engine.request_payout(&shop, None).unwrap_err();
        assert_eq!(domain_err(err), DomainError::NoBalance);

        let commission = earn_commission(&engine, &maker, &shop, "acme-stores");
        assert_eq!(commission, Money::from_major(500));
        assert_eq!(engine.balance(&shop).unwrap().available, commission);

        // Requests clamp down to the available balance, never up.
        let payout = engine
            .request_payout(&shop, Some(Money::from_major(10_000)))
            .unwrap();
        assert_eq!(payout.amount(), commission);
        assert_eq!(payout.status(), PayoutStatus::Pending);

        // The pending payout locks the whole balance.
        let summary = engine.balance(&shop).unwrap();
        assert_eq!(summary.pending_withdrawals, commission);
        assert_eq!(summary.available, Money::ZERO);
        let err = engine.request_payout(&shop, None).unwrap_err();
        assert_eq!(domain_err(err), DomainError::NoBalance);

        // Rejection releases the locked amount.
        engine
            .reject_payout(&admin(), *payout.id(), Some("bank details missing".to_string()))
            .unwrap();
        assert_eq!(engine.balance(&shop).unwrap().available, commission);
    }

    #[test]
    fn payout_lifecycle_is_admin_only_and_ordered() {
        let (engine, _) = setup();
        let (maker, _) = seed_manufacturer(&engine);
        let (shop, _) = seed_reseller(&engine, "acme-stores");
        earn_commission(&engine, &maker, &shop, "acme-stores");

        let payout = engine.request_payout(&shop, None).unwrap();

        let err = engine
            .approve_payout(&shop, *payout.id(), None)
            .unwrap_err();
        assert_eq!(domain_err(err), DomainError::AccessDenied);

        // Completion requires approval first.
        let err = engine
            .complete_payout(&admin(), *payout.id(), Some("TXN-1".to_string()))
            .unwrap_err();
        assert!(matches!(domain_err(err), DomainError::AlreadyProcessed { .. }));

        engine
            .approve_payout(&admin(), *payout.id(), Some("bank_transfer".to_string()))
            .unwrap();
        let done = engine
            .complete_payout(&admin(), *payout.id(), Some("TXN-1".to_string()))
            .unwrap();
        assert_eq!(done.status(), PayoutStatus::Completed);
        assert_eq!(done.payment_reference(), Some("TXN-1"));

        // Completed payouts count as withdrawn, not pending.
        let summary = engine.balance(&shop).unwrap();
        assert_eq!(summary.total_withdrawn, done.amount());
        assert_eq!(summary.available, Money::ZERO);

        let history = engine.payouts(&shop).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status(), PayoutStatus::Completed);
    }

    #[test]
    fn minimum_payout_applies_after_clamping() {
        let (engine, _) = setup();
        let (maker, _) = seed_manufacturer(&engine);
        let (shop, _) = seed_reseller(&engine, "acme-stores");

        // One delivered unit at 120 over base 100 earns 20, under the
        // minimum of 100.
        let product = seed_product(&engine, &maker, "SKU-TINY", 100, 10);
        engine
            .list_product(&shop, *product.id(), NewBinding::at_price(Money::from_major(120)))
            .unwrap();
        let order = engine
            .place_order("acme-stores", &cart(*product.id(), 1), customer(), address(), None)
            .unwrap();
        for next in [
            OrderStatus::Confirmed,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
        ] {
            engine.update_order_status(&shop, *order.id(), next).unwrap();
        }

        assert_eq!(engine.balance(&shop).unwrap().available, Money::from_major(20));
        let err = engine.request_payout(&shop, None).unwrap_err();
        assert!(matches!(domain_err(err), DomainError::BelowMinimum { .. }));
    }

    #[test]
    fn storefront_hides_what_buyers_cannot_buy() {
        let (engine, _) = setup();
        let (maker, _) = seed_manufacturer(&engine);
        let (shop, _) = seed_reseller(&engine, "acme-stores");
        let stocked = seed_product(&engine, &maker, "SKU-A", 1000, 10);
        let sold_out = seed_product(&engine, &maker, "SKU-B", 500, 0);

        engine
            .list_product(&shop, *stocked.id(), NewBinding::at_price(Money::from_major(1200)))
            .unwrap();
        engine
            .list_product(&shop, *sold_out.id(), NewBinding::at_price(Money::from_major(600)))
            .unwrap();

        engine
            .update_store_profile(&shop, Some("Hand-forged hardware".to_string()))
            .unwrap();
        engine
            .update_product(
                &maker,
                *stocked.id(),
                ProductUpdate {
                    description: Some(Some("Cast steel anvil".to_string())),
                    ..ProductUpdate::default()
                },
            )
            .unwrap();

        let view = engine.storefront_view("acme-stores").unwrap();
        assert_eq!(view.store_name, "Acme Stores");
        assert_eq!(view.store_description.as_deref(), Some("Hand-forged hardware"));
        assert_eq!(view.listings.len(), 1);
        assert_eq!(view.listings[0].product_id, *stocked.id());
        assert_eq!(view.listings[0].description.as_deref(), Some("Cast steel anvil"));

        // Deactivated products drop out even with stock on hand.
        engine.set_product_active(&maker, *stocked.id(), false).unwrap();
        assert!(engine.storefront_view("acme-stores").unwrap().listings.is_empty());
        engine.set_product_active(&maker, *stocked.id(), true).unwrap();

        // Management sees everything, with margins.
        let all = engine.management_view(&shop).unwrap();
        assert_eq!(all.len(), 2);
        let hidden = all
            .iter()
            .find(|l| l.binding.product_id() == *sold_out.id())
            .unwrap();
        assert!(!hidden.storefront_visible);
        assert_eq!(hidden.margin, Money::from_major(100));

        // Unpublished stores do not exist from outside.
        engine.unpublish_storefront(&shop).unwrap();
        let err = engine.storefront_view("acme-stores").unwrap_err();
        assert_eq!(domain_err(err), DomainError::StoreNotFound);
        let err = engine
            .place_order("acme-stores", &cart(*stocked.id(), 1), customer(), address(), None)
            .unwrap_err();
        assert_eq!(domain_err(err), DomainError::StoreNotFound);
    }

    #[test]
    fn config_sets_the_tax_rate_and_payout_minimum() {
        let bus: Bus = Arc::new(InMemoryEventBus::new());
        let engine = Arc::new(
            SettlementEngine::new(Arc::new(InMemoryStore::new()), bus).with_config(EngineConfig {
                settlement: SettlementConfig { tax_rate: dec!(0) },
                minimum_payout: Money::from_major(10),
            }),
        );

        let (maker, _) = seed_manufacturer(&engine);
        let (shop, _) = seed_reseller(&engine, "acme-stores");
        let product = seed_product(&engine, &maker, "SKU-001", 100, 10);
        engine
            .list_product(&shop, *product.id(), NewBinding::at_price(Money::from_major(120)))
            .unwrap();

        let order = engine
            .place_order("acme-stores", &cart(*product.id(), 1), customer(), address(), None)
            .unwrap();
        assert_eq!(order.tax_amount(), Money::ZERO);
        assert_eq!(order.total_amount(), Money::from_major(120));

        for next in [
            OrderStatus::Confirmed,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
        ] {
            engine.update_order_status(&shop, *order.id(), next).unwrap();
        }

        // 20 clears the lowered minimum of 10.
        let payout = engine.request_payout(&shop, None).unwrap();
        assert_eq!(payout.amount(), Money::from_major(20));
    }

    #[test]
    fn notifications_drive_the_dashboard_projection() {
        let (engine, projection) = setup();
        let (maker, _) = seed_manufacturer(&engine);
        let (shop, reseller) = seed_reseller(&engine, "acme-stores");

        earn_commission(&engine, &maker, &shop, "acme-stores");
        let payout = engine.request_payout(&shop, None).unwrap();
        engine.approve_payout(&admin(), *payout.id(), None).unwrap();
        engine
            .complete_payout(&admin(), *payout.id(), Some("TXN-9".to_string()))
            .unwrap();

        wait_for_processing();

        let stats = projection.stats(*reseller.id()).unwrap();
        assert_eq!(stats.orders_placed, 1);
        assert_eq!(stats.orders_delivered, 1);
        assert_eq!(stats.commission_earned, Money::from_major(500));
        assert_eq!(stats.payouts_requested, 1);
        assert_eq!(stats.amount_paid_out, Money::from_major(500));

        let board = projection.orders(*reseller.id());
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].status, OrderStatus::Delivered);
    }
}
