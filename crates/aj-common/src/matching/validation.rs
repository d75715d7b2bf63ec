use serde_json::Value;

use crate::JobPosting;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PostingError {
    #[error("posting #{index}: missing required field `{field}`")]
    MissingField { index: usize, field: &'static str },
    #[error("posting #{index}: {message}")]
    Invalid { index: usize, message: String },
}

impl PostingError {
    /// Position of the posting in the submitted batch.
    pub fn index(&self) -> usize {
        match self {
            PostingError::MissingField { index, .. } | PostingError::Invalid { index, .. } => {
                *index
            }
        }
    }
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Null) | None => true,
        Some(_) => false,
    }
}

/// Checks the structural fields a posting cannot be scored without.
pub fn validate_posting(index: usize, posting: &JobPosting) -> Result<(), PostingError> {
    if posting.id.trim().is_empty() {
        return Err(PostingError::MissingField { index, field: "id" });
    }
    if posting.title.trim().is_empty() {
        return Err(PostingError::MissingField {
            index,
            field: "title",
        });
    }
    Ok(())
}

/// Decodes one raw posting. `index` is only used for error reporting.
pub fn decode_posting(index: usize, raw: Value) -> Result<JobPosting, PostingError> {
    let Value::Object(fields) = &raw else {
        return Err(PostingError::Invalid {
            index,
            message: "expected a JSON object".into(),
        });
    };

    if is_blank(fields.get("id")) && is_blank(fields.get("job_id")) {
        return Err(PostingError::MissingField { index, field: "id" });
    }
    if is_blank(fields.get("title")) {
        return Err(PostingError::MissingField {
            index,
            field: "title",
        });
    }

    let posting: JobPosting =
        serde_json::from_value(raw).map_err(|err| PostingError::Invalid {
            index,
            message: err.to_string(),
        })?;
    validate_posting(index, &posting)?;
    Ok(posting)
}

/// Decodes a batch. Malformed entries are split out instead of failing the batch;
/// the surviving postings keep their relative order.
pub fn decode_postings(raw: Vec<Value>) -> (Vec<JobPosting>, Vec<PostingError>) {
    let mut postings = Vec::with_capacity(raw.len());
    let mut rejected = Vec::new();

    for (index, value) in raw.into_iter().enumerate() {
        match decode_posting(index, value) {
            Ok(posting) => postings.push(posting),
            Err(err) => rejected.push(err),
        }
    }

    (postings, rejected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_well_formed_postings() {
        let (postings, rejected) = decode_postings(vec![json!({
            "id": "job-1",
            "title": "Backend Engineer",
            "company": "Web Corp",
            "location": "Remote",
            "description": "SQL and Python",
            "job_type": "Full-time",
        })]);

        assert!(rejected.is_empty());
        assert_eq!(postings.len(), 1);
        assert_eq!(postings[0].location, "Remote");
        assert_eq!(postings[0].job_type.as_deref(), Some("Full-time"));
    }

    #[test]
    fn rejects_missing_title_without_failing_batch() {
        let (postings, rejected) = decode_postings(vec![
            json!({ "id": "bad" }),
            json!({ "id": "good", "title": "Data Engineer" }),
        ]);

        assert_eq!(postings.len(), 1);
        assert_eq!(postings[0].id, "good");
        assert_eq!(
            rejected,
            vec![PostingError::MissingField {
                index: 0,
                field: "title"
            }]
        );
    }

    #[test]
    fn rejects_blank_identifiers() {
        let err = decode_posting(3, json!({ "id": "  ", "title": "Engineer" })).unwrap_err();
        assert_eq!(err, PostingError::MissingField { index: 3, field: "id" });
        assert_eq!(err.index(), 3);
    }

    #[test]
    fn accepts_job_id_alias() {
        let posting = decode_posting(0, json!({ "job_id": "job-7", "title": "SRE" })).unwrap();
        assert_eq!(posting.id, "job-7");
    }

    #[test]
    fn non_objects_and_wrong_types_are_invalid() {
        let err = decode_posting(1, json!("just a string")).unwrap_err();
        assert!(matches!(err, PostingError::Invalid { index: 1, .. }));

        let err = decode_posting(2, json!({ "id": "x", "title": 42 })).unwrap_err();
        assert!(matches!(err, PostingError::Invalid { index: 2, .. }));
    }

    #[test]
    fn null_description_is_treated_as_empty() {
        let posting = decode_posting(
            0,
            json!({ "id": "x", "title": "Engineer", "description": null }),
        )
        .unwrap();
        assert_eq!(posting.description, "");
    }
}
