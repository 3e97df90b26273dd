//! Structured records submitted by administrators.

use chrono::{DateTime, Local};
use serde::Deserialize;

use crate::core::errors::ApiError;
use crate::document::{meta, DocType, Document};

pub const EMPLOYEE_FILE: &str = "employees_manual.txt";
pub const NEWS_FILE: &str = "news_announcements.txt";
pub const MANUAL_SOURCE: &str = "manual_add";

const NOT_UPDATED: &str = "Chưa cập nhật";
const UNSPECIFIED: &str = "Không xác định";

fn or_default<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

fn stamp(now: DateTime<Local>) -> String {
    now.format("%d/%m/%Y %H:%M:%S").to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeRecord {
    pub ho_ten: String,
    pub phong_ban: String,
    pub chuc_vu: String,
    #[serde(default)]
    pub so_dien_thoai: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub ngay_sinh: String,
    #[serde(default)]
    pub que_quan: String,
    #[serde(default)]
    pub ngay_vao_lam: String,
    #[serde(default)]
    pub ghi_chu: String,
}

impl EmployeeRecord {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.ho_ten.trim().is_empty() {
            return Err(ApiError::BadRequest("hoTen is required".to_string()));
        }
        Ok(())
    }

    pub fn render(&self, now: DateTime<Local>) -> String {
        format!(
            "\n---\n\
             HỌ VÀ TÊN: {}\n\
             PHÒNG BAN: {}\n\
             CHỨC VỤ: {}\n\
             SỐ ĐIỆN THOẠI: {}\n\
             EMAIL: {}\n\
             NGÀY SINH: {}\n\
             QUÊ QUÁN: {}\n\
             NGÀY VÀO LÀM: {}\n\
             GHI CHÚ: {}\n\
             NGÀY CẬP NHẬT HỆ THỐNG: {}\n\
             ---\n",
            self.ho_ten,
            self.phong_ban,
            self.chuc_vu,
            or_default(&self.so_dien_thoai, NOT_UPDATED),
            or_default(&self.email, NOT_UPDATED),
            or_default(&self.ngay_sinh, NOT_UPDATED),
            or_default(&self.que_quan, NOT_UPDATED),
            or_default(&self.ngay_vao_lam, NOT_UPDATED),
            or_default(&self.ghi_chu, "Không có"),
            stamp(now),
        )
    }

    pub fn to_document(&self, now: DateTime<Local>) -> Document {
        Document::new(self.render(now))
            .with_meta(meta::NAME, self.ho_ten.trim().to_lowercase())
            .with_meta(meta::DEPT, self.phong_ban.trim().to_lowercase())
            .with_meta(meta::SOURCE, MANUAL_SOURCE)
            .with_doc_type(DocType::Parent)
    }
}

fn default_news_kind() -> String {
    "Thông báo chung".to_string()
}

fn default_audience() -> String {
    "Toàn công ty".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsRecord {
    pub tieu_de: String,
    #[serde(default = "default_news_kind")]
    pub loai_thong_bao: String,
    #[serde(default)]
    pub ngay_ap_dung: String,
    #[serde(default)]
    pub ngay_ket_thuc: String,
    pub noi_dung: String,
    #[serde(default = "default_audience")]
    pub doi_tuong: String,
}

impl NewsRecord {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.tieu_de.trim().is_empty() || self.noi_dung.trim().is_empty() {
            return Err(ApiError::BadRequest("tieuDe and noiDung are required".to_string()));
        }
        Ok(())
    }

    pub fn render(&self, now: DateTime<Local>) -> String {
        format!(
            "\n===== THÔNG BÁO =====\n\
             TIÊU ĐỀ: {}\n\
             LOẠI: {}\n\
             ÁP DỤNG CHO: {}\n\
             NGÀY BẮT ĐẦU: {}\n\
             NGÀY KẾT THÚC: {}\n\
             NGÀY ĐĂNG: {}\n\
             NỘI DUNG:\n\
             {}\n\
             =====================\n\n",
            self.tieu_de,
            self.loai_thong_bao,
            self.doi_tuong,
            or_default(&self.ngay_ap_dung, UNSPECIFIED),
            or_default(&self.ngay_ket_thuc, UNSPECIFIED),
            stamp(now),
            self.noi_dung,
        )
    }

    pub fn to_document(&self, now: DateTime<Local>) -> Document {
        Document::new(self.render(now))
            .with_meta(meta::SOURCE, NEWS_FILE)
            .with_meta(meta::TITLE, self.tieu_de.trim().to_lowercase())
            .with_doc_type(DocType::Announce)
    }
}
