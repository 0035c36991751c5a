//! Grade normalization and push-time encryption
//!
//! Locally, every grade is stored as a plaintext number with its encryption
//! flag cleared. Grades only become ciphertext inside a sync request.
//!
//! Normalizing a grade:
//! - a number stays as it is
//! - a string not flagged as encrypted that parses as a number becomes that number
//! - anything else is decrypted; a value that fails to decrypt or is not a
//!   number becomes "unknown" (`None`), never zero
//!
//! The same normalization runs on every write path (local updates, sync
//! write-back, refresh) so the stored state never depends on which path wrote it.

use serde_json::Value;
use tracing::{debug, warn};

use studytrack_core::domain::{
    Assignment, Course, DataSnapshot, DomainError, GradePoint, GradeValue, SyncId,
};
use studytrack_core::ports::{IFieldCipher, SyncData};

// ============================================================================
// Grade-carrying fields
// ============================================================================

/// Common view over the three places a grade lives
trait GradeField: Send {
    fn value(&self) -> Option<&GradeValue>;
    fn flagged_encrypted(&self) -> bool;
    fn set_plain(&mut self, value: f64) -> Result<(), DomainError>;
    fn set_ciphertext(&mut self, ciphertext: String);
    fn clear(&mut self);
}

impl GradeField for Assignment {
    fn value(&self) -> Option<&GradeValue> {
        self.grade()
    }
    fn flagged_encrypted(&self) -> bool {
        self.is_grade_encrypted()
    }
    fn set_plain(&mut self, value: f64) -> Result<(), DomainError> {
        self.set_plain_grade(value)
    }
    fn set_ciphertext(&mut self, ciphertext: String) {
        self.set_encrypted_grade(ciphertext);
    }
    fn clear(&mut self) {
        self.clear_grade();
    }
}

impl GradeField for Course {
    fn value(&self) -> Option<&GradeValue> {
        self.current_grade()
    }
    fn flagged_encrypted(&self) -> bool {
        self.is_grade_encrypted()
    }
    fn set_plain(&mut self, value: f64) -> Result<(), DomainError> {
        self.set_plain_grade(value)
    }
    fn set_ciphertext(&mut self, ciphertext: String) {
        self.set_encrypted_grade(ciphertext);
    }
    fn clear(&mut self) {
        self.clear_grade();
    }
}

impl GradeField for GradePoint {
    fn value(&self) -> Option<&GradeValue> {
        self.grade()
    }
    fn flagged_encrypted(&self) -> bool {
        self.is_encrypted()
    }
    fn set_plain(&mut self, value: f64) -> Result<(), DomainError> {
        self.set_plain_grade(value)
    }
    fn set_ciphertext(&mut self, ciphertext: String) {
        self.set_encrypted_grade(ciphertext);
    }
    fn clear(&mut self) {
        self.clear_grade();
    }
}

// ============================================================================
// Normalization (ciphertext / stringly numbers -> plaintext)
// ============================================================================

/// Resolves a stored or received grade to a plaintext number
pub async fn plaintext_grade(
    grade: Option<&GradeValue>,
    flagged_encrypted: bool,
    cipher: &dyn IFieldCipher,
) -> Option<f64> {
    match grade? {
        GradeValue::Numeric(value) => Some(*value),
        GradeValue::Ciphertext(text) => {
            if !flagged_encrypted {
                if let Ok(value) = text.trim().parse::<f64>() {
                    return Some(value);
                }
            }
            match cipher.decrypt(text).await {
                Some(Value::Number(n)) => n.as_f64(),
                Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
                Some(_) => {
                    debug!("Decrypted grade is not a number");
                    None
                }
                None => None,
            }
        }
    }
}

async fn normalize_field<G: GradeField>(field: &mut G, id: &SyncId, cipher: &dyn IFieldCipher) {
    let value = plaintext_grade(field.value(), field.flagged_encrypted(), cipher).await;
    match value {
        Some(value) => {
            if let Err(e) = field.set_plain(value) {
                warn!(id = %id, error = %e, "Discarding invalid grade");
                field.clear();
            }
        }
        None => field.clear(),
    }
}

/// Normalizes an assignment's grade in place
pub async fn normalize_assignment(assignment: &mut Assignment, cipher: &dyn IFieldCipher) {
    let id = assignment.id.clone();
    normalize_field(assignment, &id, cipher).await;
}

/// Normalizes a course's current grade and every history point in place
pub async fn normalize_course(course: &mut Course, cipher: &dyn IFieldCipher) {
    let id = course.id.clone();
    normalize_field(course, &id, cipher).await;
    for point in course.grade_history_mut() {
        normalize_field(point, &id, cipher).await;
    }
}

pub async fn normalize_assignments(assignments: &mut [Assignment], cipher: &dyn IFieldCipher) {
    for assignment in assignments {
        normalize_assignment(assignment, cipher).await;
    }
}

pub async fn normalize_courses(courses: &mut [Course], cipher: &dyn IFieldCipher) {
    for course in courses {
        normalize_course(course, cipher).await;
    }
}

/// Normalizes every grade in a full snapshot
pub async fn normalize_snapshot(snapshot: &mut DataSnapshot, cipher: &dyn IFieldCipher) {
    normalize_assignments(&mut snapshot.assignments, cipher).await;
    normalize_courses(&mut snapshot.courses, cipher).await;
}

/// Normalizes the collections a sync response returned
pub async fn normalize_sync_data(data: &mut SyncData, cipher: &dyn IFieldCipher) {
    if let Some(assignments) = data.assignments.as_mut() {
        normalize_assignments(assignments, cipher).await;
    }
    if let Some(courses) = data.courses.as_mut() {
        normalize_courses(courses, cipher).await;
    }
}

// ============================================================================
// Encryption (plaintext -> ciphertext for a push)
// ============================================================================

async fn encrypt_field<G: GradeField>(
    field: &mut G,
    cipher: &dyn IFieldCipher,
) -> anyhow::Result<()> {
    let numeric = match field.value() {
        None => {
            field.clear();
            return Ok(());
        }
        Some(GradeValue::Ciphertext(text)) => {
            let text = text.clone();
            field.set_ciphertext(text);
            return Ok(());
        }
        Some(GradeValue::Numeric(value)) => *value,
    };

    match cipher.encrypt(Some(&Value::from(numeric))).await? {
        Some(ciphertext) => field.set_ciphertext(ciphertext),
        None => field.clear(),
    }
    Ok(())
}

/// Returns a copy of `snapshot` with every grade replaced by ciphertext
///
/// # Errors
/// Fails if the cipher cannot encrypt a value.
pub async fn encrypt_snapshot(
    snapshot: &DataSnapshot,
    cipher: &dyn IFieldCipher,
) -> anyhow::Result<DataSnapshot> {
    let mut encrypted = snapshot.clone();

    for assignment in &mut encrypted.assignments {
        encrypt_field(assignment, cipher).await?;
    }

    for course in &mut encrypted.courses {
        encrypt_field(course, cipher).await?;
        for point in course.grade_history_mut() {
            encrypt_field(point, cipher).await?;
        }
    }

    Ok(encrypted)
}
