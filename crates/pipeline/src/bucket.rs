//! 타임스탬프 버킷 라운딩
//!
//! 타임스탬프를 같은 날 자정 기준 경과 초로 환산한 뒤, 설정 간격의
//! 최근접 배수로 라운딩합니다(중간값은 올림). 같은 윈도우에 속한 여러
//! 이벤트가 하나의 집계 키로 모이도록 하는 장치입니다.

use chrono::{DateTime, Duration, NaiveTime, Timelike, Utc};

use crate::error::MeteringError;

/// 하루의 길이 (초)
const SECS_PER_DAY: u64 = 86_400;

/// 타임스탬프 버킷 계산기
///
/// 순수 함수적이며 벽시계에 의존하지 않습니다. 라운딩은 결정적이고
/// 멱등합니다: `bucket(bucket(t)) == bucket(t)`.
#[derive(Debug, Clone, Copy)]
pub struct TimeBucketer {
    /// 버킷 간격 (초)
    interval_secs: u32,
}

impl TimeBucketer {
    /// 새 버킷 계산기를 생성합니다. 간격 0은 설정 에러입니다.
    pub fn new(interval_secs: u32) -> Result<Self, MeteringError> {
        if interval_secs == 0 {
            return Err(MeteringError::Config {
                field: "metrics.bucket_interval_secs".to_owned(),
                reason: "interval must be greater than 0".to_owned(),
            });
        }
        Ok(Self { interval_secs })
    }

    /// 버킷 간격을 반환합니다 (초).
    pub fn interval_secs(&self) -> u32 {
        self.interval_secs
    }

    /// 타임스탬프를 간격의 최근접 배수로 라운딩합니다.
    ///
    /// 날짜는 유지하고 시각만 치환하며, 초 미만 정밀도는 버립니다.
    /// 정확한 중간값은 다음 버킷으로 올림합니다. 라운딩 결과가 하루를
    /// 넘기면 다음 날 자정으로 제한합니다. 자정은 모든 간격의 버킷
    /// 경계이므로 이 제한이 멱등성을 보존합니다.
    pub fn bucket(&self, timestamp: DateTime<Utc>) -> DateTime<Utc> {
        let interval = u64::from(self.interval_secs);
        let secs = u64::from(timestamp.num_seconds_from_midnight());
        let rounded = ((secs + interval / 2) / interval * interval).min(SECS_PER_DAY);

        let midnight = timestamp.date_naive().and_time(NaiveTime::MIN).and_utc();
        midnight + Duration::seconds(rounded as i64)
    }
}

/// 타임스탬프를 분 단위로 내림합니다 (초/초 미만 제거).
///
/// 자가 메트릭의 버킷으로 사용됩니다.
pub fn minute_floor(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    let secs = u64::from(timestamp.num_seconds_from_midnight());
    let floored = secs / 60 * 60;
    let midnight = timestamp.date_naive().and_time(NaiveTime::MIN).and_utc();
    midnight + Duration::seconds(floored as i64)
}
