// src/services/etiqueta_service.rs
//
// Renderiza a etiqueta do lote em PDF (térmica 80x60mm, só preto). O QR Code
// carrega apenas o token opaco do lote; os dados legíveis vão em texto.

use genpdf::{elements, style, Element};
use image::Luma;
use qrcode::QrCode;

use crate::{
    common::error::AppError,
    models::lote::{EtiquetaData, PrintJob},
};

// Dimensões da etiqueta térmica, em milímetros
const ETIQUETA_LARGURA_MM: f64 = 80.0;
const ETIQUETA_ALTURA_MM: f64 = 60.0;

#[derive(Clone)]
pub struct EtiquetaService {
    fonts_dir: String,
}

impl EtiquetaService {
    pub fn new(fonts_dir: String) -> Self {
        Self { fonts_dir }
    }

    /// Gera o PDF da etiqueta a partir do snapshot congelado do job.
    pub fn gerar_pdf(&self, job: &PrintJob) -> Result<Vec<u8>, AppError> {
        let etiqueta = decodificar_snapshot(job)?;
        self.renderizar(&etiqueta)
    }

    pub fn renderizar(&self, etiqueta: &EtiquetaData) -> Result<Vec<u8>, AppError> {
        // Carrega a fonte da pasta 'fonts/'
        let font_family = genpdf::fonts::from_files(&self.fonts_dir, "Roboto", None)
            .map_err(|e| {
                AppError::InternalServerError(anyhow::Error::msg(format!(
                    "Fonte não encontrada em {}: {}",
                    self.fonts_dir, e
                )))
            })?;

        let mut doc = genpdf::Document::new(font_family);
        doc.set_title(format!("Etiqueta {}", etiqueta.lote_numero));
        doc.set_paper_size(genpdf::Size::new(ETIQUETA_LARGURA_MM, ETIQUETA_ALTURA_MM));
        let mut decorator = genpdf::SimplePageDecorator::new();
        decorator.set_margins(3);
        doc.set_page_decorator(decorator);

        // --- CABEÇALHO: restaurante ---
        doc.push(
            elements::Paragraph::new(&etiqueta.tenant_nome)
                .styled(style::Style::new().bold().with_font_size(10)),
        );

        // --- PRODUTO ---
        doc.push(
            elements::Paragraph::new(&etiqueta.produto_nome)
                .styled(style::Style::new().bold().with_font_size(12)),
        );
        doc.push(
            elements::Paragraph::new(format!("Lote: {}", etiqueta.lote_numero))
                .styled(style::Style::new().with_font_size(8)),
        );

        // --- DATAS ---
        doc.push(
            elements::Paragraph::new(format!(
                "Fab: {}   Val: {}",
                etiqueta.data_fabricacao, etiqueta.data_validade
            ))
            .styled(style::Style::new().with_font_size(8)),
        );

        // --- CAMPOS OPCIONAIS (só entram se preenchidos) ---
        let opcionais = [
            ("Fabricante", &etiqueta.fabricante),
            ("SIF", &etiqueta.sif),
            ("Peso líq.", &etiqueta.peso_liquido),
            ("Conservação", &etiqueta.modo_conservacao),
            ("Resp. técnico", &etiqueta.responsavel_tecnico),
        ];
        for (rotulo, valor) in opcionais {
            if !valor.is_empty() {
                doc.push(
                    elements::Paragraph::new(format!("{}: {}", rotulo, valor))
                        .styled(style::Style::new().with_font_size(7)),
                );
            }
        }
        if !etiqueta.ingredientes.is_empty() {
            doc.push(
                elements::Paragraph::new(format!("Ingredientes: {}", etiqueta.ingredientes))
                    .styled(style::Style::new().with_font_size(6)),
            );
        }

        // --- QR CODE (token opaco) ---
        let code = QrCode::new(etiqueta.qr_code.as_bytes())
            .map_err(|e| AppError::InternalServerError(anyhow::Error::msg(e.to_string())))?;

        let image_buffer = code.render::<Luma<u8>>().build();
        let dynamic_image = image::DynamicImage::ImageLuma8(image_buffer);

        let pdf_image = genpdf::elements::Image::from_dynamic_image(dynamic_image)
            .map_err(|e| AppError::InternalServerError(anyhow::Error::msg(e.to_string())))?
            .with_alignment(genpdf::Alignment::Center)
            .with_scale(genpdf::Scale::new(0.35, 0.35));
        doc.push(pdf_image);

        // --- RODAPÉ: contato ---
        doc.push(
            elements::Paragraph::new(&etiqueta.tenant_email)
                .styled(style::Style::new().with_font_size(6)),
        );
        if let Some(tel) = &etiqueta.tenant_telefone {
            doc.push(
                elements::Paragraph::new(tel.as_str())
                    .styled(style::Style::new().with_font_size(6)),
            );
        }

        // Renderiza para buffer em memória
        let mut buffer = Vec::new();
        doc.render(&mut buffer)
            .map_err(|e| AppError::InternalServerError(anyhow::Error::msg(e.to_string())))?;

        Ok(buffer)
    }
}

/// O job guarda o snapshot em JSON; sem ele não há o que imprimir.
pub fn decodificar_snapshot(job: &PrintJob) -> Result<EtiquetaData, AppError> {
    let raw = job.etiqueta_data.as_deref().ok_or_else(|| {
        AppError::InvalidState("Job de impressão sem dados de etiqueta".to_string())
    })?;
    serde_json::from_str(raw).map_err(|e| AppError::InternalServerError(e.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::lote::StatusPrintJob;
    use chrono::Utc;
    use uuid::Uuid;

    fn job_com_snapshot(etiqueta_data: Option<String>) -> PrintJob {
        PrintJob {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            lote_id: Uuid::new_v4(),
            status: StatusPrintJob::Pending,
            tentativas: 0,
            erro_mensagem: None,
            etiqueta_data,
            created_at: Utc::now(),
            printed_at: None,
            completed_at: None,
        }
    }

    #[test]
    fn snapshot_valido_decodifica() {
        let json = serde_json::json!({
            "tenant_nome": "Unidade Centro",
            "tenant_email": "centro@rest.com",
            "tenant_telefone": null,
            "produto_nome": "Feijoada",
            "fabricante": "",
            "sif": "",
            "lote_numero": "L20250830-D3F2-7A1C",
            "qr_code": "LOT-abc",
            "data_fabricacao": "30/08/2025",
            "data_validade": "06/09/2025",
            "peso_liquido": "",
            "ingredientes": "",
            "modo_conservacao": "",
            "responsavel_tecnico": ""
        });
        let job = job_com_snapshot(Some(json.to_string()));
        let etiqueta = decodificar_snapshot(&job).expect("snapshot deve decodificar");
        assert_eq!(etiqueta.produto_nome, "Feijoada");
        assert_eq!(etiqueta.qr_code, "LOT-abc");
    }

    #[test]
    fn job_sem_snapshot_e_rejeitado() {
        let job = job_com_snapshot(None);
        assert!(matches!(
            decodificar_snapshot(&job),
            Err(AppError::InvalidState(_))
        ));
    }
}
