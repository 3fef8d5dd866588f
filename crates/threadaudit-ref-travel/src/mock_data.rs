//! Simulated travel-desk email threads.
//!
//! All data in this module is hardcoded and fictional. The threads stand in
//! for conversations an upstream mail parser would hand to the auditor.

use chrono::{DateTime, TimeZone, Utc};

use threadaudit_contracts::conversation::{AttachmentMeta, Conversation, Message};

const DESK: &str = "desk@travel.example";

fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, day, hour, minute, 0)
        .single()
        .unwrap_or_default()
}

fn message(sender: &str, to: &str, at: DateTime<Utc>, subject: &str, body: &str) -> Message {
    Message {
        sender: sender.to_string(),
        recipients: vec![to.to_string()],
        cc: Vec::new(),
        subject: subject.to_string(),
        timestamp: at,
        body: body.to_string(),
        quoted: None,
        attachments: Vec::new(),
    }
}

// ── Threads ───────────────────────────────────────────────────────────────────

/// London to Sydney via Doha, handled well: visa advice, limo details
/// captured, hotel offered, case number quoted.
pub fn doha_connection_booking() -> Conversation {
    let customer = "j.okafor@client.example";
    let subject = "Trip to Sydney - 14 April";

    let mut quote = message(
        DESK,
        customer,
        at(2, 10, 5),
        "RE: Trip to Sydney - 14 April [CASE 55120]",
        "Dear Ms Okafor,\n\n\
         Thank you for your request, case reference 55120.\n\n\
         Option 1: QR 8 LHR 14APR 08:40 - DOH 18:25, QR 908 DOH 20:30 - SYD 18:10+1, \
         Economy, GBP 1,240.\n\n\
         Your connection in Doha is 2h05. As a UK passport holder you do not need a \
         transit visa if you stay airside; please keep your onward boarding pass ready.\n\n\
         Would you like a car to Heathrow? If so please confirm your pickup address and \
         a mobile number for the driver. I can also hold a hotel near Circular Quay and \
         add travel insurance if helpful.\n\n\
         Kind regards,\nPriya\nTravel Desk",
    );
    quote.attachments.push(AttachmentMeta {
        filename: "itinerary_55120.pdf".to_string(),
        content_type: Some("application/pdf".to_string()),
        size_bytes: Some(48_213),
    });

    Conversation {
        conversation_id: Some("thread-doha-001".to_string()),
        transaction_id: Some("PNR7QK2".to_string()),
        messages: vec![
            message(
                customer,
                DESK,
                at(2, 9, 12),
                subject,
                "Hello,\n\nPlease book me London to Sydney on 14 April, economy. \
                 Any Gulf connection is fine.\n\nThanks,\nJoy Okafor",
            ),
            quote,
            message(
                customer,
                DESK,
                at(2, 11, 40),
                "RE: Trip to Sydney - 14 April [CASE 55120]",
                "Option 1 please. Car from 12 Elm Row, Bath BA1 2QX, mobile 07700 900123. \
                 No hotel needed.",
            ),
            message(
                DESK,
                customer,
                at(2, 12, 2),
                "RE: Trip to Sydney - 14 April [CASE 55120]",
                "Booked and ticketed, PNR 7QK2. Car confirmed for 05:15 pickup from \
                 12 Elm Row with driver contact on 07700 900123.\n\nPriya",
            ),
        ],
    }
}

/// Manchester to Manila via Dubai where the agent never mentions transit
/// rules for a Philippine passport holder.
pub fn dubai_connection_no_visa_advice() -> Conversation {
    let customer = "r.santos@client.example";

    Conversation {
        conversation_id: Some("thread-dxb-002".to_string()),
        transaction_id: Some("PNR3MD8".to_string()),
        messages: vec![
            message(
                customer,
                DESK,
                at(5, 14, 0),
                "Flight home",
                "Hi, I need Manchester to Manila on 20 March, one way. \
                 I travel on a Philippine passport.\n\nRamon",
            ),
            message(
                DESK,
                customer,
                at(5, 15, 30),
                "RE: Flight home [CASE 55188]",
                "Hi Ramon,\n\nEK 18 MAN 20MAR 20:40 - DXB 07:25+1, EK 332 DXB 09:40 - MNL \
                 22:50, GBP 612. Shall I go ahead?\n\nTom",
            ),
            message(
                customer,
                DESK,
                at(5, 16, 2),
                "RE: Flight home [CASE 55188]",
                "Yes please.",
            ),
            message(
                DESK,
                customer,
                at(5, 16, 20),
                "RE: Flight home [CASE 55188]",
                "Done, PNR 3MD8.",
            ),
        ],
    }
}

/// A short hotel-only request. Used where the content matters less than
/// the oracle's behaviour.
pub fn hotel_only_request() -> Conversation {
    let customer = "a.lind@client.example";

    Conversation {
        conversation_id: Some("thread-hotel-003".to_string()),
        transaction_id: None,
        messages: vec![
            message(
                customer,
                DESK,
                at(9, 8, 30),
                "Hotel in Frankfurt",
                "Two nights near the Messe from 23 March please, company rate.",
            ),
            message(
                DESK,
                customer,
                at(9, 9, 10),
                "RE: Hotel in Frankfurt [CASE 55230]",
                "Booked the Messe Hotel at the corporate rate, confirmation HX88231.",
            ),
        ],
    }
}

/// Every mock thread, in a stable order.
pub fn all_conversations() -> Vec<Conversation> {
    vec![
        doha_connection_booking(),
        dubai_connection_no_visa_advice(),
        hotel_only_request(),
    ]
}
