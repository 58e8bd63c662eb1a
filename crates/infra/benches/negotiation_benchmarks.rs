use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use chrono::Utc;

use renthub_auth::Principal;
use renthub_booking::{
    AcceptProposal, Booking, BookingCommand, BookingId, CalendarDate, CounterPropose,
    CreateBooking, ProposeSchedule, Terms, TimeSlot, VoucherRef,
};
use renthub_core::{Aggregate, AggregateId, TenantId, UserId};
use renthub_infra::booking_store::InMemoryBookingStore;
use renthub_infra::dispatcher::CommandDispatcher;

fn today() -> CalendarDate {
    CalendarDate::parse("2025-06-01").unwrap()
}

fn terms(date: &str, slot: &str) -> Terms {
    Terms::new(
        CalendarDate::parse(date).unwrap(),
        TimeSlot::parse(slot).unwrap(),
    )
}

fn create_cmd(booking_id: BookingId) -> BookingCommand {
    BookingCommand::Create(CreateBooking {
        booking_id,
        tenant_id: TenantId::new(),
        resource_id: None,
        requested: terms("2025-06-02", "08:00-09:00"),
        voucher: Some(VoucherRef::new("laundry/vouchers/v-001.png").unwrap()),
        today: today(),
        occurred_at: Utc::now(),
    })
}

/// One full round: create, propose, counter, accept.
fn negotiation_round(booking_id: BookingId) -> [BookingCommand; 4] {
    let tenant = Principal::tenant(UserId::new());
    let admin = Principal::administrator(UserId::new());
    [
        create_cmd(booking_id),
        BookingCommand::Propose(ProposeSchedule {
            booking_id,
            actor: admin,
            proposed: terms("2025-06-03", "09:00-10:00"),
            today: today(),
            occurred_at: Utc::now(),
        }),
        BookingCommand::CounterPropose(CounterPropose {
            booking_id,
            actor: tenant,
            counter: terms("2025-06-04", "10:00-11:00"),
            today: today(),
            occurred_at: Utc::now(),
        }),
        BookingCommand::AcceptProposal(AcceptProposal {
            booking_id,
            actor: admin,
            occurred_at: Utc::now(),
        }),
    ]
}

fn bench_aggregate_round(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate");
    group.throughput(Throughput::Elements(4));

    group.bench_function("handle_apply_round", |b| {
        b.iter(|| {
            let booking_id = BookingId::new(AggregateId::new());
            let mut booking = Booking::empty(booking_id);
            for command in negotiation_round(booking_id) {
                let events = booking.handle(black_box(&command)).unwrap();
                for event in &events {
                    booking.apply(event);
                }
            }
            black_box(booking)
        })
    });

    group.finish();
}

fn bench_dispatcher_round(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatcher");
    group.throughput(Throughput::Elements(4));

    group.bench_function("dispatch_round", |b| {
        let dispatcher = CommandDispatcher::new(InMemoryBookingStore::new());
        b.iter(|| {
            let booking_id = BookingId::new(AggregateId::new());
            let mut last = None;
            for command in negotiation_round(booking_id) {
                last = Some(dispatcher.dispatch(black_box(&command)).unwrap());
            }
            black_box(last)
        })
    });

    group.finish();
}

criterion_group!(benches, bench_aggregate_round, bench_dispatcher_round);
criterion_main!(benches);
