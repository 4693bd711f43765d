use crate::access::ViewMode;
use serde::Deserialize;
use serde_json::Value;

/// 목록에서 넘겨받은 차량 참조
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingRef {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub car_id: Option<String>,
    /// 표시용 가격 (`"Rs. 1,200,000"` 또는 숫자)
    #[serde(default)]
    pub price: Option<Value>,
}

/// 화면 진입 파라미터
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NavigationParams {
    #[serde(default)]
    pub item: Option<ListingRef>,
    #[serde(default)]
    pub mode: Option<String>,
}

/// 해석된 진입 정보
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedParams {
    pub car_id: Option<String>,
    pub initial_bid: i64,
    pub mode: ViewMode,
}

impl NavigationParams {
    pub fn for_car(car_id: impl Into<String>, mode: ViewMode) -> Self {
        Self {
            item: Some(ListingRef {
                id: Some(car_id.into()),
                ..Default::default()
            }),
            mode: Some(
                match mode {
                    ViewMode::Bid => "bid",
                    ViewMode::View => "view",
                }
                .to_string(),
            ),
        }
    }

    pub fn resolve(&self) -> ResolvedParams {
        let item = self.item.as_ref();
        let car_id = item
            .and_then(|item| non_empty(item.id.as_deref()).or(non_empty(item.car_id.as_deref())))
            .map(str::to_string);
        let initial_bid = item
            .and_then(|item| item.price.as_ref())
            .map(price_digits)
            .unwrap_or(0);
        let mode = match self.mode.as_deref() {
            Some("bid") => ViewMode::Bid,
            _ => ViewMode::View,
        };

        ResolvedParams {
            car_id,
            initial_bid,
            mode,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}

/// 표시용 가격에서 숫자만 추려 금액으로, 실패하면 0
fn price_digits(price: &Value) -> i64 {
    let text = match price {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        _ => return 0,
    };
    text.chars()
        .filter(char::is_ascii_digit)
        .collect::<String>()
        .parse()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn car_id_prefers_id_then_car_id() {
        let params: NavigationParams = serde_json::from_value(json!({
            "item": { "carId": "car-9", "price": "Rs. 1,200,000" },
            "mode": "bid"
        }))
        .unwrap();

        let resolved = params.resolve();
        assert_eq!(resolved.car_id.as_deref(), Some("car-9"));
        assert_eq!(resolved.initial_bid, 1_200_000);
        assert_eq!(resolved.mode, ViewMode::Bid);

        let params: NavigationParams = serde_json::from_value(json!({
            "item": { "id": "car-1", "carId": "car-9", "price": 450000 }
        }))
        .unwrap();
        let resolved = params.resolve();
        assert_eq!(resolved.car_id.as_deref(), Some("car-1"));
        assert_eq!(resolved.initial_bid, 450_000);
        assert_eq!(resolved.mode, ViewMode::View);
    }

    #[test]
    fn missing_item_resolves_to_preview() {
        let resolved = NavigationParams::default().resolve();
        assert_eq!(
            resolved,
            ResolvedParams {
                car_id: None,
                initial_bid: 0,
                mode: ViewMode::View,
            }
        );

        let params: NavigationParams = serde_json::from_value(json!({
            "item": { "id": "", "price": "Call for price" }
        }))
        .unwrap();
        let resolved = params.resolve();
        assert_eq!(resolved.car_id, None);
        assert_eq!(resolved.initial_bid, 0);
    }
}
