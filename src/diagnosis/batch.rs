use std::io::{Read, Write};

use serde::Serialize;
use tracing::warn;

use super::classifier::{Diagnosis, DiagnosisClassifier};

/// One classified row of a batch answer file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    pub respondent_id: String,
    pub result: Result<Diagnosis, String>,
}

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("failed to read batch file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid batch CSV data: {0}")]
    Csv(#[from] csv::Error),
}

/// Classifies every row of a CSV answer file.
///
/// The first column holds the respondent id, the remaining columns hold one option number
/// (starting at 1) per question. A bad row is reported in its outcome and does not stop the batch.
pub fn classify_csv<R: Read>(
    reader: R,
    classifier: &DiagnosisClassifier,
) -> Result<Vec<BatchOutcome>, BatchError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let mut outcomes = Vec::new();

    for record in csv_reader.records() {
        let record = record?;
        let respondent_id = record.get(0).unwrap_or_default().to_string();
        let result = parse_answers(record.iter().skip(1))
            .and_then(|answers| classifier.classify(&answers).map_err(|err| err.to_string()));

        if let Err(reason) = &result {
            warn!(respondent_id = %respondent_id, %reason, "batch row could not be classified");
        }

        outcomes.push(BatchOutcome {
            respondent_id,
            result,
        });
    }

    Ok(outcomes)
}

/// Trailing blank cells are padding. A blank cell before the last answer is a missing answer.
fn parse_answers<'a>(cells: impl Iterator<Item = &'a str>) -> Result<Vec<usize>, String> {
    let cells: Vec<&str> = cells.collect();
    let answered = cells
        .iter()
        .rposition(|cell| !cell.is_empty())
        .map_or(0, |last| last + 1);

    cells[..answered]
        .iter()
        .enumerate()
        .map(|(column, cell)| {
            let question = column + 1;
            if cell.is_empty() {
                return Err(format!("question {question} has no answer"));
            }
            match cell.parse::<usize>() {
                Ok(number) if number >= 1 => Ok(number - 1),
                _ => Err(format!(
                    "answer for question {question} must be an option number starting at 1, got '{cell}'"
                )),
            }
        })
        .collect()
}

#[derive(Debug, Serialize)]
struct BatchRow<'a> {
    respondent_id: &'a str,
    category: Option<&'a str>,
    type_name: Option<&'a str>,
    aura_keyword: Option<&'a str>,
    #[serde(rename = "O")]
    oiliness: Option<u32>,
    #[serde(rename = "D")]
    dryness: Option<u32>,
    #[serde(rename = "S")]
    sensitivity: Option<u32>,
    #[serde(rename = "Normal")]
    normal: Option<u32>,
    combination: Option<bool>,
    error: Option<&'a str>,
}

impl<'a> From<&'a BatchOutcome> for BatchRow<'a> {
    fn from(outcome: &'a BatchOutcome) -> Self {
        match &outcome.result {
            Ok(diagnosis) => BatchRow {
                respondent_id: &outcome.respondent_id,
                category: Some(diagnosis.category.as_str()),
                type_name: Some(&diagnosis.result.type_name),
                aura_keyword: Some(&diagnosis.result.aura_keyword),
                oiliness: Some(diagnosis.scores.oiliness),
                dryness: Some(diagnosis.scores.dryness),
                sensitivity: Some(diagnosis.scores.sensitivity),
                normal: Some(diagnosis.scores.normal),
                combination: Some(diagnosis.combination),
                error: None,
            },
            Err(reason) => BatchRow {
                respondent_id: &outcome.respondent_id,
                category: None,
                type_name: None,
                aura_keyword: None,
                oiliness: None,
                dryness: None,
                sensitivity: None,
                normal: None,
                combination: None,
                error: Some(reason),
            },
        }
    }
}

/// Writes outcomes as CSV with a header row.
pub fn write_csv<W: Write>(writer: W, outcomes: &[BatchOutcome]) -> Result<(), BatchError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for outcome in outcomes {
        csv_writer.serialize(BatchRow::from(outcome))?;
    }
    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_rows_and_keeps_going_after_bad_rows() {
        let input = "respondent_id,q1,q2,q3,q4,q5,q6,q7,q8,q9,q10\n\
                     r-1,3,1,1,3,1,4,2,3,3,1\n\
                     r-2,4,4,4,3,4,4,4,3,3,5\n\
                     r-3,1,1,1,1,1,1,1,1,1,0\n\
                     r-4,1,1\n";

        let classifier = DiagnosisClassifier::standard();
        let outcomes = classify_csv(input.as_bytes(), &classifier).expect("batch runs");

        assert_eq!(outcomes.len(), 4);
        let first = outcomes[0].result.as_ref().expect("r-1 classifies");
        assert_eq!(first.category.as_str(), "OILY");
        let second = outcomes[1].result.as_ref().expect("r-2 classifies");
        assert_eq!(second.category.as_str(), "NORMAL");
        assert!(outcomes[2]
            .result
            .as_ref()
            .is_err_and(|reason| reason.contains("question 10")));
        assert!(outcomes[3]
            .result
            .as_ref()
            .is_err_and(|reason| reason.contains("expected 10 answers")));
    }

    #[test]
    fn blank_cells_do_not_shift_later_answers() {
        let input = "respondent_id,q1,q2,q3,q4,q5,q6,q7,q8,q9,q10,notes\n\
                     gap,3,,1,1,3,1,4,2,3,3,1\n\
                     short-gap,3,,1,3,1,4,2,3,3,1\n\
                     padded,4,4,4,3,4,4,4,3,3,5,,\n";

        let classifier = DiagnosisClassifier::standard();
        let outcomes = classify_csv(input.as_bytes(), &classifier).expect("batch runs");

        assert_eq!(
            outcomes[0].result.as_ref().expect_err("gap rejected"),
            "question 2 has no answer"
        );
        assert_eq!(
            outcomes[1].result.as_ref().expect_err("gap rejected"),
            "question 2 has no answer"
        );
        let padded = outcomes[2].result.as_ref().expect("trailing blanks ignored");
        assert_eq!(padded.category.as_str(), "NORMAL");
    }

    #[test]
    fn writes_header_and_error_column() {
        let classifier = DiagnosisClassifier::standard();
        let outcomes = vec![
            BatchOutcome {
                respondent_id: "ok".to_string(),
                result: classifier
                    .classify(&[3, 3, 3, 2, 3, 3, 3, 2, 2, 4])
                    .map_err(|err| err.to_string()),
            },
            BatchOutcome {
                respondent_id: "bad".to_string(),
                result: Err("broken".to_string()),
            },
        ];

        let mut buffer = Vec::new();
        write_csv(&mut buffer, &outcomes).expect("writes");
        let text = String::from_utf8(buffer).expect("utf8");
        let mut lines = text.lines();

        assert_eq!(
            lines.next(),
            Some("respondent_id,category,type_name,aura_keyword,O,D,S,Normal,combination,error")
        );
        assert_eq!(
            lines.next(),
            Some("ok,NORMAL,Normal,Clear Green,0,0,0,12,false,")
        );
        assert_eq!(lines.next(), Some("bad,,,,,,,,,broken"));
    }
}
