//! Portal wire-payload fixtures and curve builders.

use crate::model::{Curve, CurvePoint};
use chrono::{NaiveDate, NaiveDateTime};

/// A minimal login page carrying the anti-forgery token the way the
/// portal's `#pg-login` form does.
pub fn login_page_html(token: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<body>
  <div id="pg-login">
    <form action="/Account/Login" method="post">
      <input name="__RequestVerificationToken" type="hidden" value="{}" />
      <input name="UserName" type="text" />
      <input name="Password" type="password" />
    </form>
  </div>
</body>
</html>"#,
        token
    )
}

/// A successful login response embedding the `W1000.start(...)` script
/// literal with the given user and work-area layout.
pub fn login_success_body(user: &str, workareas: &[(&str, &[(&str, i64)])]) -> String {
    let workareas_literal = workareas
        .iter()
        .map(|(name, windows)| {
            let windows_literal = windows
                .iter()
                .map(|(window, reportid)| {
                    format!(r#"{{name: "{}", reportid: {}}}"#, window, reportid)
                })
                .collect::<Vec<_>>()
                .join(", ");
            format!(r#"{{name: "{}", windows: [{}]}}"#, name, windows_literal)
        })
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"<!DOCTYPE html>
<html>
<body>
<script>
  W1000.start({{currentUser: "{}", workareas: [{}], sessionTimeout: 1200, locale: "hu-HU"}});
</script>
</body>
</html>"#,
        user, workareas_literal
    )
}

/// Mounts the login GET and POST mocks with a single default report,
/// `fogyasztas` with id 123. Each mock expects exactly one hit.
pub async fn mock_login(server: &mut mockito::ServerGuard) -> (mockito::Mock, mockito::Mock) {
    mock_login_with_reports(server, &[("fogyasztas", 123)]).await
}

/// Mounts the login GET and POST mocks with the given report windows in a
/// single work area.
pub async fn mock_login_with_reports(
    server: &mut mockito::ServerGuard,
    reports: &[(&str, i64)],
) -> (mockito::Mock, mockito::Mock) {
    let get = server
        .mock("GET", "/Account/Login")
        .with_status(200)
        .with_body(login_page_html("test-token"))
        .expect(1)
        .create_async()
        .await;
    let post = server
        .mock("POST", "/Account/Login")
        .with_status(200)
        .with_body(login_success_body("user@example.com", &[("default", reports)]))
        .expect(1)
        .create_async()
        .await;
    (get, post)
}

/// A realistic profile-data response: one absolute-counter curve and one
/// delta curve over three consecutive hours.
pub fn curve_array_json() -> String {
    r#"[
  {
    "name": "DP_1-1:1.8.0",
    "unit": "kWh",
    "data": [
      {"time": "2024-06-15T10:00:00", "value": 1234.5, "status": 1},
      {"time": "2024-06-15T12:00:00", "value": 1236.0, "status": 1}
    ]
  },
  {
    "name": "DP_1-1:1.29A",
    "unit": "kWh",
    "data": [
      {"time": "2024-06-15T10:15:00", "value": 0.25, "status": 1},
      {"time": "2024-06-15T10:45:00", "value": 0.25, "status": 1},
      {"time": "2024-06-15T11:15:00", "value": 0.5, "status": 1},
      {"time": "2024-06-15T12:15:00", "value": 0.5, "status": 1},
      {"time": "2024-06-15T12:45:00", "value": 0.1, "status": 0}
    ]
  }
]"#
    .to_string()
}

/// A naive timestamp at the given hour of the fixture day.
pub fn hour(hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 15)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

/// Builds a delta-signal curve with one valid point per listed hour.
pub fn delta_curve(name: &str, values: &[(u32, f64)]) -> Curve {
    Curve {
        name: name.to_string(),
        unit: "kWh".to_string(),
        data: values
            .iter()
            .map(|(h, value)| CurvePoint {
                time: hour(*h),
                value: *value,
                status: 1,
            })
            .collect(),
    }
}

/// Builds an absolute-counter curve with one valid point per listed hour.
pub fn counter_curve(name: &str, values: &[(u32, f64)]) -> Curve {
    Curve {
        name: name.to_string(),
        unit: "kWh".to_string(),
        data: values
            .iter()
            .map(|(h, value)| CurvePoint {
                time: hour(*h),
                value: *value,
                status: 1,
            })
            .collect(),
    }
}
