//! Extraction cascade behaviour through fake PDF tools and engines.

mod support;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use docverify::models::{
    Channel, DocumentJob, DocumentKind, QualityIssue, StructuredRecord, PAGE_BREAK,
};
use docverify::ocr::OcrBackendType;
use docverify::parsers::parse_record;
use docverify::services::{extract_document, ExtractionError};

use support::{
    cascade, png_bytes, qr_page, FakeCodes, FakeEngine, FakePdf, Reply, IDENTITY_XML, PDF_BYTES,
};

const SLIP_TEXT: &str = "ABC Technologies Pvt Ltd
Pay Slip for October 2025
Employee Name: John Doe
Account No: 1234567890
Net Salary: Rs. 50,000.00";

fn pdf_job(kind: DocumentKind) -> DocumentJob {
    DocumentJob::new("doc.pdf", kind, PDF_BYTES.to_vec())
}

fn echo() -> Arc<FakeEngine> {
    FakeEngine::new(OcrBackendType::PaddleOcr, Reply::Echo)
}

#[test]
fn test_text_layer_never_rasterizes() {
    let pdf = Arc::new(FakePdf::with_text_layer(SLIP_TEXT));
    let engine = echo();
    let cascade = cascade(pdf.clone(), Some(engine.clone()), None, Arc::default());

    let result = cascade.extract(&pdf_job(DocumentKind::SalarySlip)).unwrap();
    assert_eq!(result.channel, Channel::TextLayer);
    assert_eq!(result.quality.final_score, 100.0);
    assert!(result.quality.issues.is_empty());
    assert_eq!(pdf.rasterize_calls(), 0);
    assert_eq!(engine.calls(), 0);

    let doc = extract_document(&cascade, &pdf_job(DocumentKind::SalarySlip)).unwrap();
    let StructuredRecord::SalarySlip(slip) = doc.record else {
        panic!("expected salary slip");
    };
    assert_eq!(slip.net_salary, Some(50000.0));
    assert!(slip.pay_month.unwrap().contains("October 2025"));
    assert_eq!(pdf.rasterize_calls(), 0);
}

#[test]
fn test_thin_text_layer_goes_to_ocr() {
    let pdf = Arc::new(FakePdf {
        text_layer: "Page 1".to_string(),
        ..FakePdf::scanned(&[SLIP_TEXT])
    });
    let cascade = cascade(pdf.clone(), Some(echo()), None, Arc::default());

    let result = cascade.extract(&pdf_job(DocumentKind::SalarySlip)).unwrap();
    assert_eq!(pdf.rasterize_calls(), 1);
    assert_eq!(result.channel, Channel::PrimaryOcr);
    assert_eq!(result.confidence, Some(90.0));
    assert_eq!(result.quality.final_score, 85.0);
    assert!(result.text.contains("Net Salary"));
}

#[test]
fn test_every_page_is_recognized() {
    let pdf = Arc::new(FakePdf::scanned(&[
        "Employee Name: John Doe",
        "Net Salary: Rs. 50,000.00",
    ]));
    let engine = echo();
    let cascade = cascade(pdf, Some(engine.clone()), None, Arc::default());

    let result = cascade.extract(&pdf_job(DocumentKind::SalarySlip)).unwrap();
    assert_eq!(engine.calls(), 2);
    assert_eq!(result.page_count, 2);
    assert_eq!(
        result.text,
        format!("Employee Name: John Doe{}Net Salary: Rs. 50,000.00", PAGE_BREAK)
    );
}

#[test]
fn test_secondary_engine_on_primary_failure() {
    let pdf = Arc::new(FakePdf::scanned(&[SLIP_TEXT]));
    let primary = FakeEngine::new(OcrBackendType::PaddleOcr, Reply::Fail);
    let secondary = FakeEngine::new(OcrBackendType::Tesseract, Reply::Echo);
    let cascade = cascade(pdf, Some(primary.clone()), Some(secondary.clone()), Arc::default());

    let result = cascade.extract(&pdf_job(DocumentKind::SalarySlip)).unwrap();
    assert_eq!(result.channel, Channel::SecondaryOcr);
    assert_eq!(primary.calls(), 1);
    assert_eq!(secondary.calls(), 1);
}

#[test]
fn test_low_confidence_is_flagged_not_blocked() {
    let pdf = Arc::new(FakePdf::scanned(&[SLIP_TEXT]));
    let mut engine = FakeEngine::new(OcrBackendType::Tesseract, Reply::Echo);
    Arc::get_mut(&mut engine).unwrap().confidence = Some(20.0);
    let cascade = cascade(pdf, Some(engine), None, Arc::default());

    let result = cascade.extract(&pdf_job(DocumentKind::SalarySlip)).unwrap();
    assert_eq!(result.quality.final_score, 50.0);
    assert!(result.quality.has_issue(QualityIssue::LowQualityDocument));
    assert!(result.text.contains("Net Salary"));
}

#[test]
fn test_scratch_removed_after_success() {
    let pdf = Arc::new(FakePdf::scanned(&[SLIP_TEXT]));
    let cascade = cascade(pdf.clone(), Some(echo()), None, Arc::default());

    cascade.extract(&pdf_job(DocumentKind::SalarySlip)).unwrap();
    let dirs = pdf.raster_dirs();
    assert_eq!(dirs.len(), 1);
    assert!(!dirs[0].exists());
    assert!(!dirs[0].parent().unwrap().exists());
}

#[test]
fn test_scratch_removed_after_failure() {
    let pdf = Arc::new(FakePdf::scanned(&["unreadable"]));
    let engine = FakeEngine::new(OcrBackendType::Tesseract, Reply::Fail);
    let cascade = cascade(pdf.clone(), Some(engine), None, Arc::default());

    let err = cascade
        .extract(&pdf_job(DocumentKind::BankStatement))
        .unwrap_err();
    assert!(matches!(err, ExtractionError::Exhausted { .. }));

    let dirs = pdf.raster_dirs();
    assert_eq!(dirs.len(), 1);
    assert!(!dirs[0].exists());
    assert!(!dirs[0].parent().unwrap().exists());
}

#[test]
fn test_scratch_removed_after_rasterize_failure() {
    let pdf = Arc::new(FakePdf {
        fail_rasterize: true,
        ..FakePdf::scanned(&["x"])
    });
    let cascade = cascade(pdf.clone(), Some(echo()), None, Arc::default());

    assert!(cascade.extract(&pdf_job(DocumentKind::SalarySlip)).is_err());
    let dirs = pdf.raster_dirs();
    assert!(!dirs[0].parent().unwrap().exists());
}

#[test]
fn test_short_text_layer_is_last_resort() {
    let pdf = Arc::new(FakePdf {
        text_layer: "Net Pay 50000".to_string(),
        ..FakePdf::scanned(&["scan"])
    });
    let engine = FakeEngine::new(OcrBackendType::Tesseract, Reply::Fail);
    let cascade = cascade(pdf, Some(engine), None, Arc::default());

    let result = cascade.extract(&pdf_job(DocumentKind::SalarySlip)).unwrap();
    assert_eq!(result.channel, Channel::TextLayer);
    assert_eq!(result.text, "Net Pay 50000");
    assert!(result.quality.has_issue(QualityIssue::ScannedPdfOcrFailed));
}

#[test]
fn test_wrong_password_is_distinct() {
    let pdf = Arc::new(FakePdf::with_text_layer(SLIP_TEXT).locked("secret"));
    let cascade = cascade(pdf.clone(), Some(echo()), None, Arc::default());

    let missing = cascade
        .extract(&pdf_job(DocumentKind::BankStatement))
        .unwrap_err();
    assert!(missing.is_decryption());

    let wrong = pdf_job(DocumentKind::BankStatement).with_password(Some("guess".to_string()));
    let err = cascade.extract(&wrong).unwrap_err();
    assert!(err.is_decryption());
    assert!(matches!(err, ExtractionError::Decryption(_)));

    let right = pdf_job(DocumentKind::BankStatement).with_password(Some("secret".to_string()));
    assert_eq!(cascade.extract(&right).unwrap().channel, Channel::TextLayer);
    assert_eq!(pdf.rasterize_calls(), 0);
}

#[test]
fn test_password_on_plain_pdf_is_accepted() {
    let pdf = Arc::new(FakePdf::with_text_layer(SLIP_TEXT));
    let cascade = cascade(pdf, Some(echo()), None, Arc::default());

    let job = pdf_job(DocumentKind::SalarySlip).with_password(Some("unused".to_string()));
    assert!(cascade.extract(&job).is_ok());
}

#[test]
fn test_code_beats_misleading_ocr() {
    let pdf = Arc::new(FakePdf::scanned(&["front of card", &qr_page(IDENTITY_XML)]));
    let engine = FakeEngine::new(
        OcrBackendType::Tesseract,
        Reply::Fixed("Name: Mallory Impostor\nDOB: 01/01/1970\nMale\n1111 2222 3333"),
    );
    let codes = Arc::new(FakeCodes::default());
    let cascade = cascade(pdf, Some(engine.clone()), None, codes.clone());

    let extraction = cascade.extract(&pdf_job(DocumentKind::IdentityCard)).unwrap();
    assert_eq!(extraction.channel, Channel::Code);
    assert_eq!(engine.calls(), 0);
    // The identity page is tried first and decodes.
    assert_eq!(codes.calls.load(Ordering::SeqCst), 1);

    let StructuredRecord::IdentityCard(card) =
        parse_record(DocumentKind::IdentityCard, &extraction)
    else {
        panic!("expected identity card");
    };
    assert_eq!(card.name.as_deref(), Some("Anita Devi"));
    assert_eq!(card.dob.as_deref(), Some("12/03/1988"));
    assert_eq!(card.gender.as_deref(), Some("Female"));
    assert_eq!(card.id_last4.as_deref(), Some("1098"));
}

#[test]
fn test_single_page_identity_uses_page_zero() {
    let pdf = Arc::new(FakePdf::scanned(&[&qr_page(IDENTITY_XML)]));
    let cascade = cascade(pdf, Some(echo()), None, Arc::default());

    let extraction = cascade.extract(&pdf_job(DocumentKind::IdentityCard)).unwrap();
    assert_eq!(extraction.channel, Channel::Code);
}

#[test]
fn test_codes_only_tried_for_identity_cards() {
    let pdf = Arc::new(FakePdf::scanned(&[&format!("Net Salary: Rs. 50,000.00 {}", qr_page("x"))]));
    let codes = Arc::new(FakeCodes::default());
    let cascade = cascade(pdf, Some(echo()), None, codes.clone());

    let extraction = cascade.extract(&pdf_job(DocumentKind::SalarySlip)).unwrap();
    assert_eq!(extraction.channel, Channel::PrimaryOcr);
    assert_eq!(codes.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_identity_without_code_falls_back_to_ocr() {
    let text = "Government of India
Rahul Kumar Sharma
DOB: 15/08/1990
Male
2345 6789 8316";
    let pdf = Arc::new(FakePdf::scanned(&[text]));
    let cascade = cascade(pdf, Some(echo()), None, Arc::default());

    let doc = extract_document(&cascade, &pdf_job(DocumentKind::IdentityCard)).unwrap();
    assert_eq!(doc.channel, Channel::PrimaryOcr);
    let StructuredRecord::IdentityCard(card) = doc.record else {
        panic!("expected identity card");
    };
    assert_eq!(card.name.as_deref(), Some("Rahul Kumar Sharma"));
    assert_eq!(card.id_last4.as_deref(), Some("8316"));
}

#[test]
fn test_image_upload_is_recognized_directly() {
    let pdf = Arc::new(FakePdf::default());
    let cascade = cascade(pdf.clone(), Some(echo()), None, Arc::default());

    let job = DocumentJob::new("slip.png", DocumentKind::SalarySlip, png_bytes(SLIP_TEXT));
    let result = cascade.extract(&job).unwrap();
    assert_eq!(result.channel, Channel::PrimaryOcr);
    assert_eq!(pdf.rasterize_calls(), 0);
}

#[test]
fn test_front_and_back_images() {
    let engine = echo();
    let codes = Arc::new(FakeCodes::default());
    let cascade = cascade(Arc::new(FakePdf::default()), Some(engine.clone()), None, codes.clone());

    let front = DocumentJob::new("front.png", DocumentKind::IdentityCard, png_bytes("Anita Devi"));
    let back = DocumentJob::new(
        "back.png",
        DocumentKind::IdentityCard,
        png_bytes(&qr_page(IDENTITY_XML)),
    );
    let result = cascade.extract_images(&[front.clone(), back]).unwrap();
    assert_eq!(result.channel, Channel::Code);
    assert_eq!(engine.calls(), 0);

    let plain = DocumentJob::new(
        "back.png",
        DocumentKind::IdentityCard,
        png_bytes("Address: 4 Station Road, Patna"),
    );
    let result = cascade.extract_images(&[front, plain]).unwrap();
    assert_eq!(engine.calls(), 2);
    assert_eq!(result.page_count, 2);
    assert!(result.text.contains("Anita Devi"));
    assert!(result.text.contains("Station Road"));
}

#[test]
fn test_unsupported_upload() {
    let cascade = cascade(Arc::new(FakePdf::default()), Some(echo()), None, Arc::default());
    let job = DocumentJob::new("notes.txt", DocumentKind::SalarySlip, b"hello".to_vec());
    assert!(matches!(
        cascade.extract(&job),
        Err(ExtractionError::UnsupportedFormat(_))
    ));
}

const OCR_CARD: &str = "Government of India
Rahul Kumar Sharma
DOB: 15/08/1990
Male
2345 6789 8316";

#[test]
fn test_code_without_identity_payload_falls_back_to_ocr() {
    let page = format!("{}\n{}", OCR_CARD, qr_page("https://example.org/verify"));
    let pdf = Arc::new(FakePdf::scanned(&[&page]));
    let engine = echo();
    let codes = Arc::new(FakeCodes::default());
    let cascade = cascade(pdf, Some(engine.clone()), None, codes.clone());

    let doc = extract_document(&cascade, &pdf_job(DocumentKind::IdentityCard)).unwrap();
    assert_eq!(doc.channel, Channel::PrimaryOcr);
    assert_eq!(codes.calls.load(Ordering::SeqCst), 1);
    assert_eq!(engine.calls(), 1);
    let StructuredRecord::IdentityCard(card) = doc.record else {
        panic!("expected identity card");
    };
    assert_eq!(card.name.as_deref(), Some("Rahul Kumar Sharma"));
    assert_eq!(card.id_last4.as_deref(), Some("8316"));
    assert!(!card.quality.has_issue(QualityIssue::IdentityFieldsMissing));
}

#[test]
fn test_identity_code_beats_text_layer() {
    let pdf = Arc::new(FakePdf {
        text_layer: "Government of India\nMISLEADING PERSON\nDOB: 01/01/2000".to_string(),
        pages: vec!["front of card".to_string(), qr_page(IDENTITY_XML)],
        ..Default::default()
    });
    let engine = echo();
    let cascade = cascade(pdf.clone(), Some(engine.clone()), None, Arc::default());

    let doc = extract_document(&cascade, &pdf_job(DocumentKind::IdentityCard)).unwrap();
    assert_eq!(doc.channel, Channel::Code);
    assert_eq!(engine.calls(), 0);
    assert!(pdf.raster_dirs().iter().all(|dir| !dir.exists()));
    let StructuredRecord::IdentityCard(card) = doc.record else {
        panic!("expected identity card");
    };
    assert_eq!(card.name.as_deref(), Some("Anita Devi"));
    assert_eq!(card.dob.as_deref(), Some("12/03/1988"));
}

#[test]
fn test_identity_text_layer_kept_without_code() {
    let pdf = Arc::new(FakePdf::with_text_layer(OCR_CARD));
    let engine = echo();
    let cascade = cascade(pdf.clone(), Some(engine.clone()), None, Arc::default());

    let doc = extract_document(&cascade, &pdf_job(DocumentKind::IdentityCard)).unwrap();
    assert_eq!(doc.channel, Channel::TextLayer);
    assert_eq!(pdf.rasterize_calls(), 1);
    assert_eq!(engine.calls(), 0);
    let StructuredRecord::IdentityCard(card) = doc.record else {
        panic!("expected identity card");
    };
    assert_eq!(card.name.as_deref(), Some("Rahul Kumar Sharma"));
}
