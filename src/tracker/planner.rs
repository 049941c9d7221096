use rand::{seq::SliceRandom, Rng};

use crate::{
    database::DatabaseError,
    logging,
    tracker::{Clock, Ledger, Security, Unit},
    util::datetime::YearMonth,
};

/// 列出本次需要抓取的單位
///
/// 證券的順序每次以 `rng` 打散，同一檔證券的月份由舊到新。
/// 每檔證券由 `max(上市月份, floor)` 起算到當下台北月份(含)，已補齊的月份略過。
pub async fn plan<L, C, R>(
    ledger: &mut L,
    clock: &C,
    rng: &mut R,
    mut securities: Vec<Security>,
    floor: YearMonth,
) -> Result<Vec<Unit>, DatabaseError>
where
    L: Ledger,
    C: Clock,
    R: Rng + Send,
{
    securities.shuffle(rng);
    let current = YearMonth::of(&clock.now());

    let mut units = Vec::new();
    for security in &securities {
        units.extend(pending(&mut *ledger, security, floor, current).await?);
    }

    logging::info_file_async(format!(
        "Planned {} units for {} securities up to {}",
        units.len(),
        securities.len(),
        current
    ));

    Ok(units)
}

/// 單一證券尚未補齊的月份
pub async fn pending<L>(
    ledger: &mut L,
    security: &Security,
    floor: YearMonth,
    current: YearMonth,
) -> Result<Vec<Unit>, DatabaseError>
where
    L: Ledger,
{
    let start = YearMonth::of(&security.listing_date).max(floor);
    if start > current {
        return Ok(Vec::new());
    }

    let closed = ledger.closed_months(security.id).await?;

    Ok(start
        .through(current)
        .filter(|month| !closed.contains(month))
        .map(|month| Unit::new(security.id, month))
        .collect())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::{
        database::table::completion_record::CompletionRecord,
        tracker::{clock::tests::FixedClock, ledger::tests::MemoryLedger, settle, Settlement},
    };

    const FLOOR: YearMonth = YearMonth::january(2010);

    fn equity(id: i32, year: i32, month: u32, day: u32) -> Security {
        Security::new(
            id,
            NaiveDate::from_ymd_opt(year, month, day).unwrap(),
            "股票",
        )
    }

    fn seeded() -> StdRng {
        StdRng::seed_from_u64(20240610)
    }

    fn ym(year: i32, month: u32) -> YearMonth {
        YearMonth::new(year, month).unwrap()
    }

    async fn close_all(ledger: &mut MemoryLedger, security_id: i32, from: YearMonth, to: YearMonth) {
        let last_updated = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        for month in from.through(to) {
            ledger
                .mark_closed(&CompletionRecord::new(security_id, month, last_updated))
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_listing_after_floor_starts_at_listing_month() {
        let clock = FixedClock::at(2021, 5, 2);
        let mut ledger = MemoryLedger::default();

        let units = plan(&mut ledger, &clock, &mut seeded(), vec![equity(6669, 2021, 3, 15)], FLOOR)
            .await
            .unwrap();

        let months: Vec<YearMonth> = units.iter().map(|u| u.month).collect();
        assert_eq!(months, vec![ym(2021, 3), ym(2021, 4), ym(2021, 5)]);
    }

    #[tokio::test]
    async fn test_listing_before_floor_starts_at_floor() {
        let clock = FixedClock::at(2010, 2, 20);
        let mut ledger = MemoryLedger::default();

        let units = plan(&mut ledger, &clock, &mut seeded(), vec![equity(1101, 1962, 2, 9)], FLOOR)
            .await
            .unwrap();

        assert_eq!(
            units,
            vec![Unit::new(1101, ym(2010, 1)), Unit::new(1101, ym(2010, 2))]
        );
    }

    #[tokio::test]
    async fn test_closed_unit_is_not_planned_again() {
        let clock = FixedClock::at(2024, 6, 10);
        let mut ledger = MemoryLedger::default();
        let security = equity(2330, 2024, 4, 1);

        let first = plan(&mut ledger, &clock, &mut seeded(), vec![security.clone()], FLOOR)
            .await
            .unwrap();
        assert_eq!(first.len(), 3);

        for unit in first {
            settle(&mut ledger, &clock, unit).await.unwrap();
        }

        let second = plan(&mut ledger, &clock, &mut seeded(), vec![security], FLOOR)
            .await
            .unwrap();
        assert_eq!(second, vec![Unit::new(2330, ym(2024, 6))]);
    }

    #[tokio::test]
    async fn test_current_month_is_planned_until_month_advances() {
        let mut ledger = MemoryLedger::default();
        let security = equity(2330, 2024, 6, 3);
        let june = Unit::new(2330, ym(2024, 6));

        for day in [10, 11, 30] {
            let clock = FixedClock::at(2024, 6, day);
            let units = plan(&mut ledger, &clock, &mut seeded(), vec![security.clone()], FLOOR)
                .await
                .unwrap();
            assert_eq!(units, vec![june]);
            assert_eq!(
                settle(&mut ledger, &clock, june).await.unwrap(),
                Settlement::Open
            );
        }

        let july = FixedClock::at(2024, 7, 1);
        let units = plan(&mut ledger, &july, &mut seeded(), vec![security.clone()], FLOOR)
            .await
            .unwrap();
        assert_eq!(units, vec![june, Unit::new(2330, ym(2024, 7))]);

        assert!(matches!(
            settle(&mut ledger, &july, june).await.unwrap(),
            Settlement::Closed(_)
        ));
        let units = plan(&mut ledger, &july, &mut seeded(), vec![security], FLOOR)
            .await
            .unwrap();
        assert_eq!(units, vec![Unit::new(2330, ym(2024, 7))]);
    }

    #[tokio::test]
    async fn test_only_open_tail_is_planned() {
        let clock = FixedClock::at(2024, 6, 10);
        let mut ledger = MemoryLedger::default();
        close_all(&mut ledger, 1101, FLOOR, ym(2024, 5)).await;

        let units = plan(&mut ledger, &clock, &mut seeded(), vec![equity(1101, 2010, 1, 5)], FLOOR)
            .await
            .unwrap();

        assert_eq!(units, vec![Unit::new(1101, ym(2024, 6))]);
    }

    #[tokio::test]
    async fn test_gap_in_ledger_is_planned() {
        let clock = FixedClock::at(2024, 6, 10);
        let mut ledger = MemoryLedger::default();
        close_all(&mut ledger, 1101, ym(2024, 1), ym(2024, 2)).await;
        close_all(&mut ledger, 1101, ym(2024, 4), ym(2024, 5)).await;

        let units = plan(&mut ledger, &clock, &mut seeded(), vec![equity(1101, 2024, 1, 2)], FLOOR)
            .await
            .unwrap();

        assert_eq!(
            units,
            vec![Unit::new(1101, ym(2024, 3)), Unit::new(1101, ym(2024, 6))]
        );
    }

    #[tokio::test]
    async fn test_future_listing_has_no_units() {
        let clock = FixedClock::at(2024, 6, 10);
        let mut ledger = MemoryLedger::default();

        let units = plan(&mut ledger, &clock, &mut seeded(), vec![equity(7777, 2024, 8, 1)], FLOOR)
            .await
            .unwrap();

        assert!(units.is_empty());
    }

    #[tokio::test]
    async fn test_months_stay_chronological_per_security() {
        let clock = FixedClock::at(2024, 3, 10);
        let mut ledger = MemoryLedger::default();
        let securities = (1101..1111).map(|id| equity(id, 2023, 11, 1)).collect();

        let units = plan(&mut ledger, &clock, &mut seeded(), securities, FLOOR).await.unwrap();
        assert_eq!(units.len(), 10 * 5);

        for chunk in units.chunks(5) {
            let id = chunk[0].security_id;
            assert!(chunk.iter().all(|u| u.security_id == id));
            assert!(chunk.windows(2).all(|w| w[0].month < w[1].month));
        }
    }

    #[tokio::test]
    async fn test_securities_are_shuffled_by_rng() {
        let clock = FixedClock::at(2024, 6, 10);
        let securities: Vec<Security> = (1101..1131).map(|id| equity(id, 2024, 6, 3)).collect();

        let mut orders = Vec::new();
        for seed in [1, 2, 1] {
            let mut ledger = MemoryLedger::default();
            let mut rng = StdRng::seed_from_u64(seed);
            let units = plan(&mut ledger, &clock, &mut rng, securities.clone(), FLOOR)
                .await
                .unwrap();
            orders.push(units.iter().map(|u| u.security_id).collect::<Vec<i32>>());
        }

        let mut sorted = orders[0].clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (1101..1131).collect::<Vec<i32>>());
        assert_ne!(orders[0], orders[1]);
        assert_eq!(orders[0], orders[2]);
    }
}
