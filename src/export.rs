//! CSV export of verified leads.

use crate::db::VerifiedLead;

const CSV_HEADER: &str = "Name,Title,Company,Location,Email,Domain,Profile URL,Extracted Date";

/// Quote a field, doubling any embedded quotes.
fn csv_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Render verified leads as CSV in the export schema. Callers are expected
/// to pass leads already sorted newest-first.
pub fn to_csv(leads: &[VerifiedLead]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for lead in leads {
        let row = [
            csv_field(&lead.name),
            csv_field(&lead.title),
            csv_field(&lead.company),
            csv_field(lead.location.as_deref().unwrap_or("")),
            csv_field(lead.email_address.as_deref().unwrap_or("")),
            csv_field(lead.company_domain.as_deref().unwrap_or("")),
            csv_field(lead.profile_url.as_deref().unwrap_or("")),
            csv_field(&lead.extracted_at.format("%Y-%m-%d").to_string()),
        ];
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sample() -> VerifiedLead {
        VerifiedLead {
            name: "Jane Doe".into(),
            title: "VP, \"Growth\"".into(),
            company: "Acme".into(),
            location: Some("Berlin".into()),
            email_address: Some("jane.doe@acme.com".into()),
            company_domain: Some("acme.com".into()),
            profile_url: None,
            extracted_at: Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn header_matches_export_schema() {
        let csv = to_csv(&[]);
        assert_eq!(
            csv,
            "Name,Title,Company,Location,Email,Domain,Profile URL,Extracted Date\n"
        );
    }

    #[test]
    fn rows_are_quoted_and_embedded_quotes_doubled() {
        let csv = to_csv(&[sample()]);
        let row = csv.lines().nth(1).unwrap();
        assert_eq!(
            row,
            "\"Jane Doe\",\"VP, \"\"Growth\"\"\",\"Acme\",\"Berlin\",\"jane.doe@acme.com\",\"acme.com\",\"\",\"2024-03-05\""
        );
    }
}
