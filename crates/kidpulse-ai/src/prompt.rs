//! Instruction sent to the completion backend.

use chrono::NaiveDate;

const SCHEMA: &str = r#"{
  "sign_in": "H:MM AM" or null,
  "sign_out": "H:MM PM" or null,
  "bottles": [{"time": "H:MM AM", "milk_type": "Breast milk" | "Formula", "offered": 0.0, "consumed": 0.0}],
  "diapers": [{"time": "H:MM AM", "type": "Wet" | "BM" | "Dry", "notes": "text" or null}],
  "fluids": [{"time": "H:MM AM", "ounces": 0.0, "meal": "Lunch" or null}],
  "naps": [{"start": "H:MM PM", "end": "H:MM PM" or null, "position": "Back" or null}],
  "meals": [{"time": "H:MM PM", "items": "text"}]
}"#;

/// Build the extraction instruction for `child_name`'s feed on `day`.
pub fn build_prompt(feed_text: &str, child_name: &str, day: NaiveDate) -> String {
    format!(
        "You read a daycare activity feed and turn it into JSON.\n\
         Reply with a single JSON object and nothing else, shaped like this:\n\
         {schema}\n\n\
         Rules:\n\
         - Only report events for {child}. The feed can mention other children; \
         ignore their cards, including their sign-in and sign-out cards.\n\
         - Only report events that happened on {day}. Ignore every other date.\n\
         - Write all times as 12-hour clock times with AM or PM.\n\
         - Leave a list empty when the feed has no such events.\n\
         - A nap that has not ended yet gets \"end\": null.\n\n\
         Feed:\n{feed}",
        schema = SCHEMA,
        child = child_name,
        day = day.format("%b %-d, %Y"),
        feed = feed_text.trim(),
    )
}
