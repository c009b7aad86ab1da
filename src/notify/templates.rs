//! WhatsApp message bodies, in Indonesian.

use std::fmt::Write;

use crate::domain::aggregates::{Order, OrderStatus, User};

const DIVIDER: &str = "━━━━━━━━━━━━━━━━━━";

pub fn status_label(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending => "Menunggu Pembayaran",
        OrderStatus::BeingProcessed => "Sedang Diproses",
        OrderStatus::Shipped => "Dikirim",
        OrderStatus::Delivered => "Terkirim",
        OrderStatus::Cancelled => "cancelled",
    }
}

pub fn status_emoji(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending => "⏳",
        OrderStatus::BeingProcessed => "📦",
        OrderStatus::Shipped => "🚚",
        OrderStatus::Delivered => "✅",
        OrderStatus::Cancelled => "📌",
    }
}

fn status_message(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::BeingProcessed => "Pesanan Anda sedang kami persiapkan dengan baik.",
        OrderStatus::Shipped => "Pesanan Anda sedang dalam perjalanan! Mohon tunggu paket Anda.",
        OrderStatus::Delivered => "Pesanan Anda telah terkirim! Terima kasih telah berbelanja di ScentFix.",
        OrderStatus::Pending | OrderStatus::Cancelled => "",
    }
}

pub fn welcome(customer: &User) -> String {
    format!(
        "🌟 *Selamat datang di ScentFix!*\n\n\
         Halo {name}! 👋\n\n\
         Terima kasih telah mendaftar di ScentFix.\n\n\
         Kami senang Anda bergabung dengan kami! 🎉\n\n\
         *Keuntungan berbelanja di ScentFix:*\n\
         ✨ Produk berkualitas\n\
         🚚 Gratis ongkir\n\
         💳 Berbagai metode pembayaran\n\
         📦 Tracking pesanan real-time\n\n\
         Selamat berbelanja! 🛍️\n\n\
         - Tim ScentFix",
        name = customer.name()
    )
}

pub fn order_confirmation(customer: &User, order: &Order) -> String {
    let mut lines = String::new();
    for item in order.items() {
        let _ = writeln!(lines, "• {} ({}x) - {}", item.name, item.quantity, item.price.format_idr());
    }
    format!(
        "🎉 *Terima kasih atas pesanan Anda!*\n\n\
         *ScentFix - Order Confirmation*\n\
         {DIVIDER}\n\
         📦 Order ID: {number}\n\
         👤 Nama: {name}\n\n\
         *Detail Pesanan:*\n\
         {lines}\n\
         💰 *Total: {total}*\n\n\
         Status: {emoji} {label}\n\n\
         Kami akan segera memproses pesanan Anda. Terima kasih telah berbelanja di ScentFix! 🌟",
        number = order.order_number(),
        name = customer.name(),
        total = order.total_amount().format_idr(),
        emoji = status_emoji(order.status()),
        label = status_label(order.status()),
    )
}

pub fn status_update(customer: &User, order: &Order, status: OrderStatus) -> String {
    format!(
        "📦 *Update Status Pesanan*\n\n\
         *ScentFix*\n\
         {DIVIDER}\n\
         Order ID: {number}\n\
         Nama: {name}\n\n\
         Status: {emoji} *{label}*\n\n\
         {message}\n\n\
         Terima kasih telah berbelanja di ScentFix! 🌟",
        number = order.order_number(),
        name = customer.name(),
        emoji = status_emoji(status),
        label = status_label(status),
        message = status_message(status),
    )
}
