// src/services/mailer.rs

use std::env;

use lettre::{
    message::Mailbox,
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::models::convenio::Convenio;

// Notificador por e-mail. O envio é melhor-esforço: uma falha de SMTP é
// logada e descartada, nunca desfaz nem bloqueia o cadastro do convênio.
// Sem as variáveis SMTP_* no ambiente o notificador fica desabilitado.
#[derive(Clone)]
pub struct Mailer {
    transporte: Option<AsyncSmtpTransport<Tokio1Executor>>,
    remetente: Option<Mailbox>,
}

impl Mailer {
    // Monta o transporte a partir de SMTP_HOST, SMTP_PORT (padrão 587,
    // STARTTLS), SMTP_USERNAME, SMTP_PASSWORD e MAIL_FROM.
    pub fn from_env() -> Self {
        let host = env::var("SMTP_HOST").ok();
        let username = env::var("SMTP_USERNAME").ok();
        let password = env::var("SMTP_PASSWORD").ok();
        let from = env::var("MAIL_FROM").ok().or_else(|| username.clone());

        let (Some(host), Some(username), Some(password), Some(from)) =
            (host, username, password, from)
        else {
            tracing::warn!("SMTP não configurado; notificações por e-mail desabilitadas.");
            return Self { transporte: None, remetente: None };
        };

        let porta: u16 = env::var("SMTP_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(587);

        let remetente: Mailbox = match from.parse() {
            Ok(mailbox) => mailbox,
            Err(e) => {
                tracing::error!("MAIL_FROM inválido ({}); e-mail desabilitado.", e);
                return Self { transporte: None, remetente: None };
            }
        };

        let transporte = match AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&host) {
            Ok(builder) => Some(
                builder
                    .port(porta)
                    .credentials(Credentials::new(username, password))
                    .build(),
            ),
            Err(e) => {
                tracing::error!("Falha ao configurar o SMTP ({}); e-mail desabilitado.", e);
                None
            }
        };

        Self { transporte, remetente: Some(remetente) }
    }

    // Avisa o diretor responsável sobre a nova parceria. Fire-and-forget em
    // relação à transação: o convênio já está gravado quando chegamos aqui.
    pub async fn notify_director(&self, destino: &str, convenio: &Convenio) {
        let (Some(transporte), Some(remetente)) = (&self.transporte, &self.remetente) else {
            tracing::debug!(
                "Notificação para {} ignorada: SMTP desabilitado.",
                destino
            );
            return;
        };

        let destinatario: Mailbox = match destino.parse() {
            Ok(mailbox) => mailbox,
            Err(e) => {
                tracing::error!("E-mail do diretor inválido ('{}'): {}", destino, e);
                return;
            }
        };

        let vigencia = convenio
            .data_assinatura
            .map(|d| d.format("%d/%m/%Y").to_string())
            .unwrap_or_else(|| "data a definir".to_string());

        let assunto = format!("Nova Parceria Cadastrada - {}", convenio.nome_conveniada);
        let corpo = format!(
            "Prezado(a) Diretor(a),\n\n\
             Informamos que a unidade {} firmou nova parceria com a empresa {},\n\
             com benefícios educacionais válidos a partir de {}.\n\n\
             Termo anexado: [https://uniespvestibular.com.br/convenios/]\n\n\
             Atenciosamente,\n\
             Equipe UNIESP\n",
            convenio.unidade_uniesp, convenio.nome_conveniada, vigencia
        );

        let mensagem = match Message::builder()
            .from(remetente.clone())
            .to(destinatario)
            .subject(assunto)
            .body(corpo)
        {
            Ok(mensagem) => mensagem,
            Err(e) => {
                tracing::error!("Falha ao montar o e-mail de notificação: {}", e);
                return;
            }
        };

        match transporte.send(mensagem).await {
            Ok(_) => {
                tracing::info!("E-mail enviado com sucesso para {}.", destino);
            }
            Err(e) => {
                tracing::error!("Erro ao enviar e-mail para {}: {}", destino, e);
            }
        }
    }
}
